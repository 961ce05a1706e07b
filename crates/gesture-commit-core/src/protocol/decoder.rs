//! Inbound frame decoding.
//!
//! Frames are JSON objects with optional `event`, `type`, `count` and
//! `status` fields. Anything that does not map onto a [`DomainEvent`] is
//! logged and dropped; decoding never fails the receive loop.
//!
//! Hand counts may arrive as integers or as integral floats (`2.0`).

use crate::protocol::{AudioKind, DomainEvent, GestureKind};

use serde::Deserialize;
use serde_json::Number;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
struct InboundFrame {
    #[serde(default)]
    event: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    count: Option<Number>,
    #[serde(default)]
    status: Option<String>,
}

/// Decode one text frame from the detector.
///
/// Returns `None` for status messages, malformed JSON and any payload
/// outside the known event set.
#[instrument(skip(raw), fields(len = raw.len()))]
pub fn decode(raw: &str) -> Option<DomainEvent> {
    let frame: InboundFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "Discarding malformed detector frame");
            return None;
        }
    };

    if let Some(status) = frame.status {
        info!(status = %status, "Detector status");
        return None;
    }

    let Some(event) = frame.event else {
        warn!("Discarding detector frame without event field");
        return None;
    };

    match event.as_str() {
        "gesture" => gesture_kind(&frame.kind, &event).map(DomainEvent::GestureDetected),
        "gesture_lost" => gesture_kind(&frame.kind, &event).map(DomainEvent::GestureLost),
        "audio" => {
            let Some(token) = frame.kind.as_deref() else {
                warn!(event = %event, "Discarding audio event without type");
                return None;
            };
            match AudioKind::from_wire(token) {
                Some(kind) => Some(DomainEvent::AudioDetected(kind)),
                None => {
                    warn!(event = %event, kind = %token, "Discarding unknown audio kind");
                    None
                }
            }
        }
        "hand_count" => {
            let count = frame.count.as_ref().and_then(hand_count);
            match count {
                Some(n) => {
                    debug!(count = n, "Hand count update");
                    Some(DomainEvent::HandCount(n))
                }
                None => {
                    warn!(count = ?frame.count, "Discarding hand_count without non-negative count");
                    None
                }
            }
        }
        other => {
            warn!(event = %other, "Discarding unknown detector event");
            None
        }
    }
}

fn hand_count(count: &Number) -> Option<u32> {
    if let Some(n) = count.as_u64() {
        return u32::try_from(n).ok();
    }

    count
        .as_f64()
        .filter(|n| n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(n))
        .map(|n| n as u32)
}

fn gesture_kind(kind: &Option<String>, event: &str) -> Option<GestureKind> {
    let Some(token) = kind.as_deref() else {
        warn!(event = %event, "Discarding gesture event without type");
        return None;
    };

    let parsed = GestureKind::from_wire(token);
    if parsed.is_none() {
        warn!(event = %event, kind = %token, "Discarding unknown gesture kind");
    }
    parsed
}
