//! Canned diagnosis text, grouped by the pass that emits it.
//!
//! The resolver only ever picks from these tables; nothing here is computed.

pub mod location {
    pub const HEAD_LABEL: &str = "Head Pulley Mistracking";
    pub const HEAD_CAUSES: &[&str] = &[
        "Head pulley lagging worn unevenly or delaminated",
        "Head pulley shaft out of square with the conveyor centerline",
        "Material build-up on the head pulley face",
    ];
    pub const HEAD_REPAIRS: &[&str] = &[
        "Inspect and replace worn head pulley lagging",
        "Square the head pulley to the frame using the bearing take-up bolts",
        "Clean the pulley face and check the primary belt cleaner",
    ];

    pub const TAIL_LABEL: &str = "Tail Pulley Mistracking";
    pub const TAIL_CAUSES: &[&str] = &[
        "Tail pulley misaligned or take-up adjusted unevenly",
        "Carryback and fines packing onto the tail pulley",
    ];
    pub const TAIL_REPAIRS: &[&str] = &[
        "Re-square the tail pulley and equalise take-up tension on both sides",
        "Install or adjust a V-plow to keep fines off the return side",
        "Check tail pulley bearings for wear or movement",
    ];
    pub const TAIL_BENEFIT: &str = "A BeltSaver self-cleaning tail pulley sheds packed fines \
and keeps the belt centered where carryback collects.";

    pub const MIDSPAN_LABEL: &str = "Midspan Belt Drift";
    pub const MIDSPAN_CAUSES: &[&str] = &[
        "Idlers out of alignment or seized",
        "Conveyor frame not level or not straight",
    ];
    pub const MIDSPAN_REPAIRS: &[&str] = &[
        "Align troughing and return idlers square to the belt",
        "Replace seized or damaged idler rolls",
        "Survey the stringer for level and straightness",
        "Fit self-aligning training idlers on the affected span",
    ];

    pub const MULTIPLE_LABEL: &str = "System-Wide Tracking Instability";
    pub const MULTIPLE_CAUSES: &[&str] = &[
        "Belt splice not square",
        "Belt camber or manufacturing defect",
        "Structural misalignment along the whole conveyor",
        "Uneven belt tension across the width",
    ];
    pub const MULTIPLE_REPAIRS: &[&str] = &[
        "Perform a full conveyor alignment survey",
        "Inspect every splice for squareness",
        "Check belt tension across the full width",
        "Consider professional belt tracking service",
    ];
    pub const MULTIPLE_BENEFIT: &str = "BeltSaver pulleys at the head and tail give the belt a \
stable reference at both ends, reducing drift along the entire system.";
}

pub mod direction {
    pub const LOADED_CAUSES: &[&str] = &[
        "Off-center loading at the transfer chute",
        "Worn or uneven impact bed under the load zone",
    ];
    pub const LOADED_REPAIRS: &[&str] = &[
        "Adjust chute deflectors so material lands on the belt center",
        "Inspect and level the impact bed or impact idlers",
    ];

    pub const ALTERNATING_CAUSES: &[&str] = &[
        "Belt splice cut or bonded out of square",
        "Belt camber causing the belt to snake",
    ];
    pub const ALTERNATING_REPAIRS: &[&str] = &[
        "Re-splice the belt square to its centerline",
        "Measure belt camber and replace the belt section if out of tolerance",
    ];
}

pub mod severity {
    pub const CRITICAL_REPAIR: &str =
        "STOP CONVEYOR IMMEDIATELY - belt is at risk of damage or structural contact";
    pub const SEVERE_REPAIR: &str =
        "Schedule emergency maintenance within 24 hours to prevent belt damage";
}

pub mod symptom {
    pub const EDGE_WEAR_CAUSE: &str = "Belt edge rubbing against the structure or skirting";
    pub const EDGE_WEAR_REPAIR: &str =
        "Inspect belt edges and trim or repair damaged sections";
    pub const EDGE_WEAR_BENEFIT: &str = "BeltSaver pulleys keep the belt centered so edges \
stop contacting the frame, extending belt life.";

    pub const SPILLAGE_REPAIR: &str = "Check skirt board seals and clean up spillage regularly";

    pub const NOISE_CAUSE: &str = "Belt contacting structure or failing bearings";
    pub const NOISE_REPAIR: &str = "Inspect bearings and listen for contact points along the run";
}
