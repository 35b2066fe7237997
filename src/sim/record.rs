use super::stats::Stats;
use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/// the persisted shape of one run. a file holds an array of these.
/// older files may lack the last three keys, so they decode as None.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub utilization: Vec<f64>,
    pub jain: Vec<f64>,
    pub bfr: Vec<f64>,
    #[serde(default)]
    pub empty: Option<Vec<f64>>,
    #[serde(default)]
    pub collisions: Option<Vec<f64>>,
    #[serde(default)]
    pub num_active: Option<Vec<usize>>,
}

impl From<&Stats> for Record {
    fn from(stats: &Stats) -> Self {
        Self {
            utilization: stats.total_utilization.clone(),
            jain: stats.jain.clone(),
            bfr: stats.bottom_fair_ratio.clone(),
            empty: Some(stats.empty.clone()),
            collisions: Some(stats.collisions.clone()),
            num_active: Some(stats.num_active.clone()),
        }
    }
}

impl Record {
    pub fn save(records: &[Record], path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("create {}", path.display()))?;
        serde_json::to_writer(file, records)
            .with_context(|| format!("encode {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Vec<Record>> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open {}", path.display()))?;
        let records = serde_json::from_reader(file)
            .with_context(|| format!("decode {}", path.display()))?;
        Ok(records)
    }
}
