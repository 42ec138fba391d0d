#[cfg(feature = "redis")]
use async_trait::async_trait;
#[cfg(feature = "redis")]
use redis::AsyncCommands;

#[cfg(feature = "redis")]
use crate::error::StoreError;
#[cfg(feature = "redis")]
use crate::store::{SessionStore, SettleResult};
#[cfg(feature = "redis")]
use crate::types::{ArtifactId, PaymentSession, SettlementId};

/// Redis-backed session store.
///
/// Sessions live as JSON strings under per-artifact keys; a sorted set
/// scored by creation time drives `recent`. The settle transition runs
/// as a Lua script so the status check and the write are one atomic
/// step on the server.
#[cfg(feature = "redis")]
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
    settle_script: redis::Script,
}

#[cfg(feature = "redis")]
const SETTLE_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return 'missing'
end
local session = cjson.decode(raw)
if session.status == 'SUCCESS' then
  return 'already'
end
session.status = 'SUCCESS'
session.settlement_id = ARGV[1]
redis.call('SET', KEYS[1], cjson.encode(session))
return 'settled'
"#;

#[cfg(feature = "redis")]
impl RedisStore {
    pub fn new(client: redis::Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            settle_script: redis::Script::new(SETTLE_SCRIPT),
        }
    }

    fn session_key(&self, artifact_id: &ArtifactId) -> String {
        format!("{}:session:{}", self.prefix, artifact_id.0)
    }

    fn recent_key(&self) -> String {
        format!("{}:recent", self.prefix)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)
    }
}

#[cfg(feature = "redis")]
fn unavailable(err: redis::RedisError) -> StoreError {
    StoreError::Unavailable {
        message: err.to_string(),
    }
}

/// Decode a stored session record. A record that exists but does not
/// parse is corruption, not absence, and must not masquerade as an
/// unknown id.
#[cfg(feature = "redis")]
fn decode_session(raw: &str) -> Result<PaymentSession, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::Unavailable {
        message: format!("corrupt session record: {}", err),
    })
}

#[cfg(feature = "redis")]
#[async_trait]
impl SessionStore for RedisStore {
    async fn create(&self, session: &PaymentSession) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(session).map_err(|err| StoreError::Unavailable {
            message: err.to_string(),
        })?;

        redis::pipe()
            .set(self.session_key(&session.artifact_id), payload)
            .zadd(
                self.recent_key(),
                session.artifact_id.0.as_str(),
                session.created_at_ms,
            )
            .query_async::<()>(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn find(&self, artifact_id: &ArtifactId) -> Result<Option<PaymentSession>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(self.session_key(artifact_id))
            .await
            .map_err(unavailable)?;
        match raw {
            None => Ok(None),
            Some(value) => decode_session(&value).map(Some),
        }
    }

    async fn settle(
        &self,
        artifact_id: &ArtifactId,
        settlement_id: &SettlementId,
    ) -> Result<SettleResult, StoreError> {
        let mut conn = self.connection().await?;
        let verdict: String = self
            .settle_script
            .key(self.session_key(artifact_id))
            .arg(settlement_id.0.as_str())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        match verdict.as_str() {
            "settled" => Ok(SettleResult::Settled),
            "already" => Ok(SettleResult::AlreadySettled),
            _ => Ok(SettleResult::NotFound),
        }
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PaymentSession>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.connection().await?;
        let stop = limit.saturating_sub(1) as isize;
        let ids: Vec<String> = conn
            .zrevrange(self.recent_key(), 0, stop)
            .await
            .map_err(unavailable)?;

        let mut sessions = Vec::with_capacity(ids.len());
        for id in ids {
            let raw: Option<String> = conn
                .get(self.session_key(&ArtifactId(id)))
                .await
                .map_err(unavailable)?;
            // A listed id with no record means the session key expired
            // or was removed; skip it. A record that will not decode is
            // corruption and propagates.
            let Some(value) = raw else { continue };
            sessions.push(decode_session(&value)?);
        }
        Ok(sessions)
    }
}
