//! Digests answering invitation authentication challenges.

use bytes::{BufMut, BytesMut};
use sha2::{Digest, Sha256};
use tracing::info;

use super::command::{CommandCode, CommandPacket};
use super::config::Credentials;
use super::error::TransportError;

/// Bytes of the challenge payload used as the nonce
pub const NONCE_LEN: usize = 16;

/// Nonce carried by an `*_AUTH_REQUIRED` reply: its first 16 bytes, or
/// the whole payload when shorter.
#[must_use]
pub fn nonce(challenge: &[u8]) -> &[u8] {
    &challenge[..challenge.len().min(NONCE_LEN)]
}

/// `SHA-256(nonce ‖ secret)`
#[must_use]
pub fn shared_secret_digest(challenge: &[u8], secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(nonce(challenge));
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// `SHA-256(nonce ‖ username ‖ password)`
#[must_use]
pub fn user_digest(challenge: &[u8], username: &str, password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(nonce(challenge));
    hasher.update(username.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Build the invitation answering an authentication challenge.
///
/// Fails with [`TransportError::SharedSecretRequired`] or
/// [`TransportError::UserAuthRequired`] when the configured credentials do
/// not match the requested method.
pub fn answer_challenge(
    challenge: &CommandPacket,
    credentials: Option<&Credentials>,
) -> Result<CommandPacket, TransportError> {
    match (challenge.command(), credentials) {
        (CommandCode::InvitationReplyAuthRequired, Some(Credentials::SharedSecret(secret))) => {
            info!("answering shared secret challenge");
            let digest = shared_secret_digest(challenge.payload(), secret);
            Ok(CommandPacket::new(
                CommandCode::InvitationWithAuth,
                0,
                digest.to_vec(),
            )?)
        }
        (CommandCode::InvitationReplyAuthRequired, _) => Err(TransportError::SharedSecretRequired),
        (
            CommandCode::InvitationReplyUserAuthRequired,
            Some(Credentials::User { username, password }),
        ) => {
            info!(%username, "answering user authentication challenge");
            let digest = user_digest(challenge.payload(), username, password);
            let user = username.as_bytes();
            let padded = user.len().div_ceil(4) * 4;
            let mut payload = BytesMut::with_capacity(digest.len() + padded);
            payload.put_slice(&digest);
            payload.put_slice(user);
            payload.put_bytes(0, padded - user.len());
            Ok(CommandPacket::new(
                CommandCode::InvitationWithUserAuth,
                0,
                payload.freeze(),
            )?)
        }
        (CommandCode::InvitationReplyUserAuthRequired, _) => Err(TransportError::UserAuthRequired),
        (command, _) => Err(TransportError::Session(
            super::session::SessionError::UnsupportedCommand { command },
        )),
    }
}
