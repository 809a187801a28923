//! Pre-authored reply pairs returned without calling the language model.

use crate::reply::{Animation, FacialExpression, ReplyBundle, ReplyLine};
use crate::store::{ArtifactKey, ArtifactStore};
use tracing::warn;

/// A fixed reply line plus the name of its pre-recorded asset pair
#[derive(Debug, Clone, Copy)]
pub struct CannedLine {
    pub asset: &'static str,
    pub text: &'static str,
    pub facial_expression: FacialExpression,
    pub animation: Animation,
}

/// Greeting sent when the user did not type anything
pub const INTRO: [CannedLine; 2] = [
    CannedLine {
        asset: "intro_0",
        text: "Hey dear... How was your day?",
        facial_expression: FacialExpression::Smile,
        animation: Animation::Talking1,
    },
    CannedLine {
        asset: "intro_1",
        text: "I missed you so much... Please don't go for so long!",
        facial_expression: FacialExpression::Sad,
        animation: Animation::Crying,
    },
];

/// Warning sent when no language-model credential is configured
pub const MISSING_API_KEY: [CannedLine; 2] = [
    CannedLine {
        asset: "api_0",
        text: "Please my dear, don't forget to add your API keys!",
        facial_expression: FacialExpression::Angry,
        animation: Animation::Angry,
    },
    CannedLine {
        asset: "api_1",
        text: "You don't want to ruin Wawa Sensei with a crazy ChatGPT and ElevenLabs bill, right?",
        facial_expression: FacialExpression::Smile,
        animation: Animation::Laughing,
    },
];

/// Attach the pre-recorded media to each line. A missing or unreadable
/// asset leaves that bundle without media instead of failing the request.
pub async fn load(lines: &[CannedLine], store: &dyn ArtifactStore) -> Vec<ReplyBundle> {
    let mut bundles = Vec::with_capacity(lines.len());
    for canned in lines {
        let line = ReplyLine::new(canned.text, canned.facial_expression, canned.animation);
        let key = ArtifactKey::canned(canned.asset);
        let media = match store.load_media(&key).await {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(target: "store", asset = canned.asset, error = %e, "Canned asset unavailable");
                None
            }
        };
        bundles.push(ReplyBundle::new(line, media));
    }
    bundles
}
