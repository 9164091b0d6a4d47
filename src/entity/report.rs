use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::lvm::{PhysicalVolume, ResizeTarget, VolumeGroup};

#[derive(Debug)]
pub struct Report {
    pub root: Option<String>,
    pub dry_run: bool,
    pub outcome: Outcome,
    pub duration: std::time::Duration,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "root": self.root,
            "dryRun": self.dry_run,
            "outcome": self.outcome,
            "elapsedTime": self.duration,
        })
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json_string())
    }
}

/// What a single command did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "createdPv")]
    CreatedPv(String),

    #[serde(rename = "pvs")]
    Pvs(Vec<PhysicalVolume>),

    #[serde(rename = "resizedPv")]
    ResizedPv { pv: String, target: ResizeTarget },

    #[serde(rename = "removedPv")]
    RemovedPv(String),

    #[serde(rename = "createdVg")]
    CreatedVg { vg: String, pvs: Vec<String> },

    #[serde(rename = "vgs")]
    Vgs(Vec<VolumeGroup>),

    #[serde(rename = "grubConfig")]
    GrubConfig(std::collections::BTreeMap<String, String>),

    #[serde(rename = "grubConfigWritten")]
    GrubConfigWritten { keys: Vec<String> },

    #[serde(rename = "grubScriptAdded")]
    GrubScriptAdded(String),

    #[serde(rename = "grubScriptRemoved")]
    GrubScriptRemoved(String),

    #[serde(rename = "grubInstalled")]
    GrubInstalled { disk: String, target: String },

    #[serde(rename = "grubMkconfig")]
    GrubMkconfig(String),
}

#[test]
fn test_report_json() {
    let report = Report {
        root: Some("/mnt".to_string()),
        dry_run: false,
        outcome: Outcome::CreatedVg {
            vg: "data".to_string(),
            pvs: vec!["/dev/loop0p1".to_string(), "/dev/loop0p2".to_string()],
        },
        duration: std::time::Duration::from_secs(2),
    };

    let v = report.to_json();
    assert_eq!("/mnt", v["root"]);
    assert_eq!(false, v["dryRun"]);
    assert_eq!("data", v["outcome"]["createdVg"]["vg"]);
    assert_eq!("/dev/loop0p2", v["outcome"]["createdVg"]["pvs"][1]);
    assert_eq!(2, v["elapsedTime"]["secs"]);

    let printed: serde_json::Value =
        serde_json::from_str(&report.to_string()).expect("report is not json");
    assert_eq!(v, printed);
}
