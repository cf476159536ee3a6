use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{
    header::{HeaderMap, RETRY_AFTER},
    Client, StatusCode,
};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::{
    config::SubgraphSettings,
    models::{EventKind, LiquidityEvent, Pool, Token},
    source::{sort_newest_first, EventQuery, EventSource, SourceError},
    utils::{parse_decimal, parse_u64},
};

/// Fields requested for every event entity.
const EVENT_FIELDS: &str = "id timestamp amount0 amount1 amountUSD \
     pool { id feeTier \
     token0 { id symbol name decimals } \
     token1 { id symbol name decimals } }";

/// Event source reading mints, burns and (optionally) swaps from a Uniswap
/// v3-style subgraph.
///
/// All requested entities are fetched in a single GraphQL request using the
/// same keyset filter, each capped at `limit`. The merged result is re-sorted
/// newest first and cut back to `limit`, which yields exactly the first
/// `limit` events of the combined stream.
///
/// Graph-node orders timestamp ties by id in the same direction as the
/// primary sort, so the `(timestamp, id)` cursor below lines up with the
/// order each entity list is returned in.
pub struct SubgraphSource {
    client: Client,
    url: Url,
    api_key: Option<String>,
    include_swaps: bool,
    request_timeout: Duration,
}

impl SubgraphSource {
    pub fn new(settings: &SubgraphSettings) -> Result<Self> {
        let url = Url::parse(&settings.url)
            .with_context(|| format!("Invalid subgraph URL: {}", settings.url))?;
        let request_timeout = Duration::from_secs(settings.request_timeout_secs);

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            api_key: settings.api_key.clone(),
            include_swaps: settings.include_swaps,
            request_timeout,
        })
    }

    fn entities(&self) -> &'static [(&'static str, EventKind)] {
        const WITH_SWAPS: &[(&str, EventKind)] = &[
            ("mints", EventKind::Mint),
            ("burns", EventKind::Burn),
            ("swaps", EventKind::Swap),
        ];
        if self.include_swaps {
            WITH_SWAPS
        } else {
            &WITH_SWAPS[..2]
        }
    }
}

/// Build the GraphQL document querying each entity with the shared keyset filter.
fn build_query(entities: &[(&str, EventKind)]) -> String {
    let selections: Vec<String> = entities
        .iter()
        .map(|(entity, _)| {
            format!(
                "{entity}(first: $first, orderBy: timestamp, orderDirection: desc, \
                 where: {{ and: [{{ timestamp_gte: $lower }}, \
                 {{ or: [{{ timestamp_lt: $cursorTs }}, \
                 {{ timestamp: $cursorTs, id_lt: $cursorId }}] }}] }}) \
                 {{ {fields} }}",
                fields = EVENT_FIELDS
            )
        })
        .collect();

    format!(
        "query LiquidityEvents($lower: BigInt!, $cursorTs: BigInt!, \
         $cursorId: ID!, $first: Int!) {{ {} }}",
        selections.join(" ")
    )
}

/// Variables for [`build_query`].
///
/// Without a cursor the page starts just past `upper_bound` with an empty id,
/// which selects `timestamp <= upper_bound`.
fn query_variables(query: &EventQuery) -> serde_json::Value {
    let (cursor_ts, cursor_id) = match &query.after {
        Some(cursor) => (
            cursor.timestamp.min(query.upper_bound.saturating_add(1)),
            cursor.id.clone(),
        ),
        None => (query.upper_bound.saturating_add(1), String::new()),
    };

    json!({
        "lower": query.lower_bound.to_string(),
        "cursorTs": cursor_ts.to_string(),
        "cursorId": cursor_id,
        "first": query.limit,
    })
}

#[derive(Debug, Deserialize)]
struct GraphResponse {
    data: Option<EventsData>,
    #[serde(default)]
    errors: Vec<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct EventsData {
    #[serde(default)]
    mints: Vec<RawEvent>,
    #[serde(default)]
    burns: Vec<RawEvent>,
    #[serde(default)]
    swaps: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    timestamp: String,
    amount0: String,
    amount1: String,
    #[serde(rename = "amountUSD")]
    amount_usd: String,
    pool: RawPool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPool {
    id: String,
    fee_tier: String,
    token0: RawToken,
    token1: RawToken,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    id: String,
    symbol: String,
    name: String,
    decimals: String,
}

impl RawToken {
    fn into_token(self) -> Result<Token, String> {
        let decimals = parse_u64("token.decimals", &self.decimals)?;
        let decimals = u8::try_from(decimals)
            .map_err(|_| format!("token.decimals: {} out of range", decimals))?;
        Ok(Token::new(self.id, self.symbol, self.name, decimals))
    }
}

/// Convert a decoded response into at most `limit` events, newest first.
///
/// Pools are interned so events of the same pool share one `Arc<Pool>`.
fn into_events(data: EventsData, limit: usize) -> Result<Vec<LiquidityEvent>, SourceError> {
    let mut pools: FxHashMap<String, Arc<Pool>> = FxHashMap::default();
    let mut events = Vec::with_capacity(data.mints.len() + data.burns.len() + data.swaps.len());

    let batches = [
        (EventKind::Mint, data.mints),
        (EventKind::Burn, data.burns),
        (EventKind::Swap, data.swaps),
    ];

    for (kind, raw_events) in batches {
        for raw in raw_events {
            let event = convert_event(kind, raw, &mut pools).map_err(SourceError::Decode)?;
            events.push(event);
        }
    }

    sort_newest_first(&mut events);
    events.truncate(limit);
    Ok(events)
}

fn convert_event(
    kind: EventKind,
    raw: RawEvent,
    pools: &mut FxHashMap<String, Arc<Pool>>,
) -> Result<LiquidityEvent, String> {
    let pool_id = raw.pool.id.to_lowercase();
    let pool = match pools.get(&pool_id) {
        Some(pool) => pool.clone(),
        None => {
            let fee_tier = parse_u64("pool.feeTier", &raw.pool.fee_tier)?;
            let fee_tier = u32::try_from(fee_tier)
                .map_err(|_| format!("pool.feeTier: {} out of range", fee_tier))?;
            let pool = Arc::new(Pool::new(
                raw.pool.id,
                raw.pool.token0.into_token()?,
                raw.pool.token1.into_token()?,
                fee_tier,
            ));
            pools.insert(pool_id, pool.clone());
            pool
        },
    };

    Ok(LiquidityEvent {
        timestamp: parse_u64("timestamp", &raw.timestamp)?,
        amount0: parse_decimal("amount0", &raw.amount0)?,
        amount1: parse_decimal("amount1", &raw.amount1)?,
        amount_usd: parse_decimal("amountUSD", &raw.amount_usd)?,
        id: raw.id,
        kind,
        pool,
    })
}

/// Delay-seconds form of `Retry-After`. HTTP dates are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Map a non-success HTTP status onto a [`SourceError`].
///
/// Rate limiting and server errors are retryable, anything else is not.
fn check_status(status: StatusCode, headers: &HeaderMap) -> Result<(), SourceError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SourceError::RateLimited {
            retry_after: parse_retry_after(headers),
        });
    }
    if status.is_server_error() {
        return Err(SourceError::Transport(format!("HTTP {}", status)));
    }
    if !status.is_success() {
        return Err(SourceError::Upstream(format!("HTTP {}", status)));
    }
    Ok(())
}

/// Decode a GraphQL response body. Reported errors win over any partial data.
fn decode_payload(body: &[u8]) -> Result<EventsData, SourceError> {
    let payload: GraphResponse =
        serde_json::from_slice(body).map_err(|e| SourceError::Decode(e.to_string()))?;

    if !payload.errors.is_empty() {
        let messages: Vec<String> = payload.errors.into_iter().map(|e| e.message).collect();
        return Err(SourceError::Upstream(messages.join("; ")));
    }

    payload
        .data
        .ok_or_else(|| SourceError::Decode("response carried no data".to_string()))
}

#[async_trait]
impl EventSource for SubgraphSource {
    async fn fetch_page(&self, query: &EventQuery) -> Result<Vec<LiquidityEvent>, SourceError> {
        let entities = self.entities();
        let body = json!({
            "query": build_query(entities),
            "variables": query_variables(query),
        });

        let mut request = self.client.post(self.url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let request_error = |e: reqwest::Error| {
            if e.is_timeout() {
                SourceError::Timeout(self.request_timeout)
            } else {
                SourceError::Transport(e.to_string())
            }
        };

        let response = request.send().await.map_err(request_error)?;
        check_status(response.status(), response.headers())?;

        let body = response.bytes().await.map_err(request_error)?;
        let data = decode_payload(&body)?;

        let events = into_events(data, query.limit)?;
        debug!(
            "Subgraph page [{}, {}] after {:?}: {} event(s)",
            query.lower_bound,
            query.upper_bound,
            query.after,
            events.len()
        );
        Ok(events)
    }
}
