//! Fetch-with-retry for both protocols
//!
//! Every attempt waits the command delay first. The loggers need a pause
//! between commands and the CMI only serves about one request per minute.
//! A reply that is too short, fails to decode or reports a non-zero CMI
//! status counts as a failed attempt.

use blnet_codec::{parse_document, CmiDocument};
use blnet_core::{BlnetError, BlnetResult, CmiRequest, CmiStatus, Command};
use blnet_transport::{CommandExchange, JsonExchange};
use bytes::Bytes;
use log::{error, warn};
use std::time::Duration;

/// Attempt bound and command spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before giving up, at least 1
    pub max_attempts: u32,
    /// Pause before every attempt
    pub command_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const STREAM_COMMAND_DELAY: Duration = Duration::from_millis(2000);
    pub const HTTP_COMMAND_DELAY: Duration = Duration::from_secs(60);

    pub fn new(max_attempts: u32, command_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            command_delay,
        }
    }

    /// Defaults for the BL-NET and D-LOGG byte stream
    pub fn stream() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::STREAM_COMMAND_DELAY)
    }

    /// Defaults for the rate-limited CMI JSON API
    pub fn http() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::HTTP_COMMAND_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::stream()
    }
}

/// Send a command until a reply of sufficient length arrives
///
/// # Arguments
/// * `exchange` - One-command-per-connection exchange
/// * `command` - Command to send
/// * `policy` - Attempt bound and command spacing
///
/// # Returns
/// The first valid reply, or [`BlnetError::MaxRetriesExceeded`]
pub async fn fetch_with_retry<E>(
    exchange: &mut E,
    command: &Command,
    policy: &RetryPolicy,
) -> BlnetResult<Bytes>
where
    E: CommandExchange + ?Sized,
{
    fetch_decoded(exchange, command, policy, |reply| {
        Ok(Bytes::copy_from_slice(reply))
    })
    .await
}

/// Send a command until its reply decodes
///
/// Decode failures are retried like transport failures, except for errors
/// that can not heal on another attempt (an unknown logger mode), which are
/// returned at once.
pub async fn fetch_decoded<E, T, F>(
    exchange: &mut E,
    command: &Command,
    policy: &RetryPolicy,
    decode: F,
) -> BlnetResult<T>
where
    E: CommandExchange + ?Sized,
    F: Fn(&[u8]) -> BlnetResult<T> + Send,
{
    let min_len = command.min_response_len();
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.command_delay).await;

        match exchange.exchange(command).await {
            Ok(reply) if reply.len() < min_len => {
                warn!(
                    "Command {}: attempt {}/{} got a {}-byte reply, need at least {}",
                    command,
                    attempt,
                    policy.max_attempts,
                    reply.len(),
                    min_len
                );
            }
            Ok(reply) => match decode(&reply) {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!(
                        "Command {}: attempt {}/{} returned an undecodable reply: {}",
                        command, attempt, policy.max_attempts, e
                    );
                }
            },
            Err(e) => {
                warn!(
                    "Command {}: attempt {}/{} failed: {}",
                    command, attempt, policy.max_attempts, e
                );
            }
        }
    }

    error!(
        "Command {}: no valid reply after {} attempts",
        command, policy.max_attempts
    );
    Err(BlnetError::MaxRetriesExceeded {
        attempts: policy.max_attempts,
    })
}

fn log_status(request: &CmiRequest, status: CmiStatus, attempt: u32, max: u32) {
    match status {
        CmiStatus::NodeError | CmiStatus::TooManyRequests | CmiStatus::CanBusy => {
            warn!("CMI {}: attempt {}/{}: {}", request, attempt, max, status)
        }
        _ => error!("CMI {}: attempt {}/{}: {}", request, attempt, max, status),
    }
}

/// Request a CMI document until one with status 0 decodes
pub async fn fetch_document<J>(
    exchange: &mut J,
    request: &CmiRequest,
    policy: &RetryPolicy,
) -> BlnetResult<CmiDocument>
where
    J: JsonExchange + ?Sized,
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.command_delay).await;

        let result = match exchange.get_json(request).await {
            Ok(body) => parse_document(&body),
            Err(e) => Err(e),
        };
        match result {
            Ok(document) => return Ok(document),
            Err(BlnetError::ProtocolStatus(status)) => {
                log_status(request, status, attempt, policy.max_attempts)
            }
            Err(e) => warn!(
                "CMI {}: attempt {}/{} failed: {}",
                request, attempt, policy.max_attempts, e
            ),
        }
    }

    error!(
        "CMI {}: no valid document after {} attempts",
        request, policy.max_attempts
    );
    Err(BlnetError::MaxRetriesExceeded {
        attempts: policy.max_attempts,
    })
}
