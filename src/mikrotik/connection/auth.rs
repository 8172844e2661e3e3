// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS authentication

use md5::compute as md5_compute;

use super::RouterOsConnection;
use crate::error::{AppError, Result};

impl RouterOsConnection {
    pub(crate) async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        tracing::trace!("Attempting login for user: {}", username);
        // Plain login (RouterOS 6.43+). Older routers ignore the credentials
        // and answer with a challenge instead.
        let sentences = self
            .raw_command(&[
                "/login".to_string(),
                format!("=name={username}"),
                format!("=password={password}"),
            ])
            .await
            .map_err(into_auth_error)?;

        let challenge = sentences.iter().find_map(|s| s.get("ret").cloned());
        match challenge {
            None => {
                tracing::debug!("Login successful (plain method)");
                Ok(())
            }
            Some(challenge_hex) => {
                tracing::debug!("Router requested challenge-response login");
                self.login_challenge(username, password, &challenge_hex)
                    .await
            }
        }
    }

    /// Legacy challenge-response login (pre-6.43)
    async fn login_challenge(
        &mut self,
        username: &str,
        password: &str,
        challenge_hex: &str,
    ) -> Result<()> {
        tracing::trace!("Challenge received, length: {}", challenge_hex.len());
        let challenge = hex::decode(challenge_hex)
            .map_err(|e| AppError::Auth(format!("Invalid login challenge: {e}")))?;

        self.raw_command(&[
            "/login".to_string(),
            format!("=name={username}"),
            format!("=response={}", challenge_response(password, &challenge)),
        ])
        .await
        .map_err(into_auth_error)?;

        tracing::debug!("Login successful (challenge method)");
        Ok(())
    }
}

/// `00` followed by hex MD5 of `0x00 + password + challenge`
pub(super) fn challenge_response(password: &str, challenge: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + password.len() + challenge.len());
    data.push(0u8);
    data.extend_from_slice(password.as_bytes());
    data.extend_from_slice(challenge);
    let digest = md5_compute(&data);
    let mut response = String::from("00");
    response.push_str(&hex::encode(digest.0));
    response
}

fn into_auth_error(e: AppError) -> AppError {
    match e {
        AppError::RouterOs(msg) => AppError::Auth(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_response_format() {
        let response = challenge_response("secret", &[0xAB; 16]);
        assert_eq!(response.len(), 34);
        assert!(response.starts_with("00"));
        assert!(response[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_challenge_response_known_digest() {
        // md5 of a single zero byte
        let response = challenge_response("", &[]);
        assert_eq!(response, "0093b885adfe0da089cdf634904fd59f71");
    }

    #[test]
    fn test_trap_maps_to_auth_error() {
        let err = into_auth_error(AppError::RouterOs("invalid user name or password".into()));
        assert!(matches!(err, AppError::Auth(_)));
        let err = into_auth_error(AppError::Timeout("read".into()));
        assert!(matches!(err, AppError::Timeout(_)));
    }
}
