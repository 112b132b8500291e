//! 解析パイプライン
//!
//! 画像 → リクエスト構築 → 送信 → 応答パース → 解析結果（+サムネイル）

use crate::error::Result;
use crate::imaging;
use crate::store::RecordStore;
use crate::transport::Transport;
use image::DynamicImage;
use log::{info, warn};
use scan_ai_common::{
    build_chat_request, parse_response, AnalysisOutcome, ChatRequest, Mode, ModelParams,
    PersistedRecord, PromptContext, Thumbnail,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Analyzer {
    transport: Arc<dyn Transport>,
    context: PromptContext,
    params: ModelParams,
}

impl Analyzer {
    pub fn new(transport: Arc<dyn Transport>, context: PromptContext, params: ModelParams) -> Self {
        Self {
            transport,
            context,
            params,
        }
    }

    pub fn context(&self) -> &PromptContext {
        &self.context
    }

    /// 読み込み済み画像とモードから送信リクエストを構築
    pub fn build_request(&self, image: &DynamicImage, mode: Mode) -> Result<ChatRequest> {
        let encoded = imaging::encode_for_upload(image)?;
        Ok(build_chat_request(&encoded, mode, &self.context, &self.params))
    }

    /// 1枚の画像を解析
    ///
    /// # Arguments
    /// * `image` - 元画像のバイト列（PNG/JPEG など）
    /// * `mode` - 解析モード
    /// * `cancel` - 送信中の中断用
    ///
    /// # Returns
    /// 解析結果。APIキー未設定 → 画像変換エラーの順に、ネットワークに触れる前に返る
    pub async fn analyze(
        &self,
        image: &[u8],
        mode: Mode,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome> {
        self.transport.ready()?;

        let image = imaging::decode(image)?;
        let request = self.build_request(&image, mode)?;
        info!("解析開始: {} ({})", mode.label(), self.params.model);

        let body = self.transport.send(&request, cancel).await?;
        let mut outcome = parse_response(&body, mode)?;

        match imaging::make_thumbnail(&image) {
            Ok(jpeg) => outcome.attach_thumbnail(Some(Thumbnail::from(jpeg))),
            Err(e) => warn!("サムネイル作成に失敗: {}", e),
        }

        info!(
            "解析完了: {} / {} ({}件)",
            outcome.title,
            outcome.value,
            outcome.payload.len()
        );
        Ok(outcome)
    }
}

/// 解析結果を履歴に保存
pub fn save(store: &dyn RecordStore, outcome: &AnalysisOutcome) -> Result<PersistedRecord> {
    let record = PersistedRecord::from_outcome(outcome)?;
    store.insert(&record)?;
    info!("履歴に保存: {}", record.id);
    Ok(record)
}
