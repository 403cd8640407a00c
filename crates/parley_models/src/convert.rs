//! Conversion from Parley completion requests to provider wire types

use crate::{ChatCompletionRequest, Message};
use parley_core::Role;
use parley_interface::CompletionRequest;

/// Convert a completion request into the streaming wire request.
///
/// An attachment is carried by the last user message as an extra image part.
#[tracing::instrument(skip(request), fields(model = %request.model, messages = request.messages.len()))]
pub fn to_chat_request(request: &CompletionRequest, max_tokens: Option<u32>) -> ChatCompletionRequest {
    let image_target = request.attachment.as_ref().and_then(|_| {
        request
            .messages
            .iter()
            .rposition(|m| m.role() == Role::User)
    });

    if request.attachment.is_some() && image_target.is_none() {
        tracing::warn!("Attachment present but no user message to carry it, dropping attachment");
    }

    let messages = request
        .messages
        .iter()
        .enumerate()
        .map(|(index, message)| match (&request.attachment, image_target) {
            (Some(attachment), Some(target)) if target == index => {
                Message::user_with_image(message.content(), attachment.image_url.clone())
            }
            _ => Message::new(message.role().as_str(), message.content()),
        })
        .collect();

    ChatCompletionRequest {
        model: request.model.clone(),
        messages,
        max_tokens,
        stream: true,
    }
}
