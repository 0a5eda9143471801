use serde::Serialize;

use super::Construct;
use crate::{template::Resource, Expr, InfraError};

/// Capacity mode. Only on-demand is used: shards scale with traffic and no
/// shard count is declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamMode {
    OnDemand,
}

#[derive(Clone, Debug)]
pub struct Stream {
    pub logical_id: String,
    pub mode: StreamMode,
}

impl Stream {
    pub fn on_demand(logical_id: &str) -> Self {
        Stream {
            logical_id: logical_id.to_string(),
            mode: StreamMode::OnDemand,
        }
    }

    pub fn name(&self) -> Expr {
        Expr::reference(&self.logical_id)
    }

    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StreamModeDetails {
    stream_mode: StreamMode,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StreamProperties {
    stream_mode_details: StreamModeDetails,
}

impl Construct for Stream {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn resource(&self) -> Result<Resource, InfraError> {
        Resource::new(
            "AWS::Kinesis::Stream",
            &StreamProperties {
                stream_mode_details: StreamModeDetails {
                    stream_mode: self.mode,
                },
            },
        )
    }
}
