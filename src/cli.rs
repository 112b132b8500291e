use clap::{Parser, Subcommand, ValueEnum};
use scan_ai_common::{Mode, UnitSystem};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scan-ai")]
#[command(about = "写真からAIで重量・寸法・カロリー・植物・翻訳・個数を推定するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真を1枚解析
    Analyze {
        /// 画像ファイルのパス
        #[arg(required = true)]
        image: PathBuf,

        /// 解析モード
        #[arg(short, long, default_value = "weight")]
        mode: ModeArg,

        /// 単位系（デフォルト: 設定値）
        #[arg(long)]
        units: Option<UnitsArg>,

        /// 翻訳先言語（デフォルト: 設定値）
        #[arg(long)]
        language: Option<String>,

        /// 結果を履歴に保存
        #[arg(long)]
        save: bool,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 保存済みの解析履歴を一覧表示
    History {
        /// 表示件数
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// 保存済みの解析結果を表示
    Show {
        /// レコードID
        #[arg(required = true)]
        id: String,
    },

    /// 保存済みの解析結果を削除
    Delete {
        /// レコードID
        #[arg(required = true)]
        id: String,
    },

    /// 解析モード一覧
    Modes,

    /// 設定
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// APIキーを削除
        #[arg(long)]
        clear_api_key: bool,

        /// 単位系を設定
        #[arg(long)]
        units: Option<UnitsArg>,

        /// 翻訳先言語を設定
        #[arg(long)]
        language: Option<String>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Weight,
    Dimensions,
    Calories,
    PlantId,
    Translate,
    ObjectCount,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Weight => Mode::Weight,
            ModeArg::Dimensions => Mode::Dimensions,
            ModeArg::Calories => Mode::Calories,
            ModeArg::PlantId => Mode::PlantId,
            ModeArg::Translate => Mode::Translate,
            ModeArg::ObjectCount => Mode::ObjectCount,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum UnitsArg {
    Metric,
    Imperial,
}

impl From<UnitsArg> for UnitSystem {
    fn from(arg: UnitsArg) -> Self {
        match arg {
            UnitsArg::Metric => UnitSystem::Metric,
            UnitsArg::Imperial => UnitSystem::Imperial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "scan-ai", "analyze", "food.jpg", "-m", "calories", "--units", "metric", "--save",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { image, mode, units, save, json, .. } => {
                assert_eq!(image, PathBuf::from("food.jpg"));
                assert_eq!(Mode::from(mode), Mode::Calories);
                assert_eq!(units.map(UnitSystem::from), Some(UnitSystem::Metric));
                assert!(save);
                assert!(!json);
            }
            _ => panic!("analyze expected"),
        }
    }

    #[test]
    fn test_mode_default_and_kebab_case() {
        let cli = Cli::try_parse_from(["scan-ai", "analyze", "a.png"]).unwrap();
        assert!(matches!(cli.command, Commands::Analyze { mode: ModeArg::Weight, .. }));

        let cli = Cli::try_parse_from(["scan-ai", "analyze", "a.png", "-m", "plant-id"]).unwrap();
        assert!(matches!(cli.command, Commands::Analyze { mode: ModeArg::PlantId, .. }));
    }

    #[test]
    fn test_every_mode_has_arg() {
        for mode in Mode::ALL {
            let found = ModeArg::value_variants()
                .iter()
                .any(|arg| Mode::from(*arg) == mode);
            assert!(found, "{mode:?}");
        }
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["scan-ai", "analyze", "a.png", "-m", "barcode"]).is_err());
    }
}
