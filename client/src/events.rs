use futures::stream::{BoxStream, StreamExt};
use larder_common::events::ChangeEvent;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::error::ClientError;

/// Connect to the server's change-event socket.
///
/// The stream ends when the server closes the connection. Frames that are not
/// change events are skipped.
pub async fn subscribe_changes(url: &str) -> Result<BoxStream<'static, ChangeEvent>, ClientError> {
    let (ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(Box::new)?;
    debug!(%url, "subscribed to change events");

    let events = ws
        .take_while(|frame| futures::future::ready(frame.is_ok()))
        .filter_map(|frame| async move {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str(text.as_str()) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        debug!(error = %e, "ignoring undecodable event frame");
                        None
                    }
                },
                _ => None,
            }
        });
    Ok(events.boxed())
}
