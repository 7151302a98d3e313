//! Machine types and the panels each one shows.
//!
//! Dispatch by machine type is a lookup in this table rather than a chain of
//! id comparisons; the analytics facade walks the panels of a kind and runs
//! the matching engine operation for each.

use crate::error::UptimeError;
use crate::tags;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineKind {
    BatchBlender,
    ContinuousBlender,
    GravimetricHopper,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    /// Whole history of a tag reduced to chart buckets.
    Binned { name: &'static str, tag_id: u32 },
    /// Values of the newest sample of a tag.
    Latest { name: &'static str, tag_id: u32 },
    /// Running fraction over the running-state history.
    Utilization { name: &'static str },
}

impl Panel {
    pub fn name(&self) -> &'static str {
        match self {
            Panel::Binned { name, .. } | Panel::Latest { name, .. } | Panel::Utilization { name } => *name,
        }
    }

    pub fn tag_id(&self) -> u32 {
        match self {
            Panel::Binned { tag_id, .. } | Panel::Latest { tag_id, .. } => *tag_id,
            Panel::Utilization { .. } => tags::RUNNING_STATE,
        }
    }
}

const BATCH_BLENDER: &[Panel] = &[
    Panel::Latest { name: "targets", tag_id: tags::WEIGHT_TARGETS },
    Panel::Latest { name: "actuals", tag_id: tags::WEIGHT_ACTUALS },
    Panel::Utilization { name: "total_running_percentage" },
];

const CONTINUOUS_BLENDER: &[Panel] = &[
    Panel::Binned { name: "energy_consumption", tag_id: tags::ENERGY_CONSUMPTION },
];

const GRAVIMETRIC_HOPPER: &[Panel] = &[
    Panel::Binned { name: "energy_consumption", tag_id: tags::ENERGY_CONSUMPTION },
    Panel::Binned { name: "hopper_inventories", tag_id: tags::HOPPER_INVENTORY },
    Panel::Binned { name: "hauloff_lengths", tag_id: tags::HAULOFF_LENGTH },
    Panel::Binned { name: "actual_points", tag_id: tags::ACTUAL_POINTS },
    Panel::Binned { name: "set_points", tag_id: tags::SET_POINTS },
];

impl MachineKind {
    pub fn panels(&self) -> &'static [Panel] {
        match self {
            MachineKind::BatchBlender => BATCH_BLENDER,
            MachineKind::ContinuousBlender => CONTINUOUS_BLENDER,
            MachineKind::GravimetricHopper => GRAVIMETRIC_HOPPER,
            MachineKind::Generic => &[],
        }
    }

    pub fn required_tags(&self) -> Vec<u32> {
        let mut tag_ids: Vec<u32> = self.panels().iter().map(Panel::tag_id).collect();
        tag_ids.sort_unstable();
        tag_ids.dedup();
        tag_ids
    }
}

impl FromStr for MachineKind {
    type Err = UptimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "batch_blender" => Ok(MachineKind::BatchBlender),
            "continuous_blender" => Ok(MachineKind::ContinuousBlender),
            "gravimetric_hopper" => Ok(MachineKind::GravimetricHopper),
            "generic" => Ok(MachineKind::Generic),
            other => Err(UptimeError::InvalidInput {
                message: format!("unknown machine kind '{}'", other),
            }),
        }
    }
}
