//! Static corrective-action templates keyed by root-cause family

use crate::types::{CauseFamily, Finding};

/// What a template requires of the dominant finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Any finding of the family
    Any,
    /// Environmental finding whose factor column name contains the keyword
    Factor(&'static str),
}

impl Trigger {
    pub fn matches(&self, finding: &Finding) -> bool {
        match self {
            Trigger::Any => true,
            Trigger::Factor(keyword) => finding
                .factor
                .as_deref()
                .is_some_and(|f| f.to_ascii_lowercase().contains(keyword)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActionTemplate {
    pub family: CauseFamily,
    pub trigger: Trigger,
    pub action: &'static str,
    pub description: &'static str,
    pub steps: &'static [&'static str],
    pub estimated_impact: &'static str,
}

pub static TEMPLATES: &[ActionTemplate] = &[
    ActionTemplate {
        family: CauseFamily::Equipment,
        trigger: Trigger::Any,
        action: "Equipment Maintenance",
        description: "Perform preventive maintenance check on problematic equipment",
        steps: &[
            "Check equipment operating parameters",
            "Review maintenance history",
            "Perform calibration and adjustment",
            "Replace worn components",
        ],
        estimated_impact: "Can reduce 30-50% of equipment-related defects",
    },
    ActionTemplate {
        family: CauseFamily::Temporal,
        trigger: Trigger::Any,
        action: "Adjust Production Schedule",
        description: "Increase quality checks during peak issue periods",
        steps: &[
            "Increase inspection frequency during peak hours",
            "Assign experienced operators",
            "Add monitoring equipment",
            "Implement real-time alert system",
        ],
        estimated_impact: "Can reduce 20-40% of time-related defects",
    },
    ActionTemplate {
        family: CauseFamily::Operator,
        trigger: Trigger::Any,
        action: "Operator Training",
        description: "Refresh work instructions and supervise the affected operator",
        steps: &[
            "Review work instructions with the operator",
            "Pair with an experienced operator for the next shifts",
            "Verify training records and certifications",
            "Audit the next production runs",
        ],
        estimated_impact: "Can reduce 15-30% of operator-related defects",
    },
    ActionTemplate {
        family: CauseFamily::Environmental,
        trigger: Trigger::Factor("temperature"),
        action: "Temperature Control",
        description: "Implement stricter temperature monitoring and control",
        steps: &[
            "Install temperature sensors and alarms",
            "Set temperature thresholds",
            "Optimize cooling system",
            "Train operators to identify temperature anomalies",
        ],
        estimated_impact: "Can reduce 25-45% of temperature-related defects",
    },
    ActionTemplate {
        family: CauseFamily::Environmental,
        trigger: Trigger::Factor("vibration"),
        action: "Vibration Control",
        description: "Reduce equipment vibration",
        steps: &[
            "Check equipment balance",
            "Replace worn bearings",
            "Reinforce equipment foundation",
            "Implement vibration monitoring system",
        ],
        estimated_impact: "Can reduce 20-35% of vibration-related defects",
    },
    ActionTemplate {
        family: CauseFamily::Environmental,
        trigger: Trigger::Factor("pressure"),
        action: "Pressure Regulation",
        description: "Stabilize process pressure within control limits",
        steps: &[
            "Calibrate pressure sensors and regulators",
            "Inspect seals and lines for leaks",
            "Define pressure control limits",
            "Add pressure trend alarms",
        ],
        estimated_impact: "Can reduce 20-35% of pressure-related defects",
    },
    ActionTemplate {
        family: CauseFamily::Environmental,
        trigger: Trigger::Factor("humidity"),
        action: "Humidity Control",
        description: "Keep production area humidity within material limits",
        steps: &[
            "Install humidity monitoring in production areas",
            "Service dehumidification equipment",
            "Set humidity limits for sensitive materials",
            "Store materials in climate-controlled areas",
        ],
        estimated_impact: "Can reduce 15-30% of humidity-related defects",
    },
];
