//! Deterministic creative direction for generated modules.
//!
//! The same document, module title, and position always map to the same
//! direction and mechanics, so regenerating a module keeps its look.

use playforge_core::hash::{pick_by_hash, stable_hash};

/// One art-direction entry fed verbatim into the render prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignDirection {
    pub name: &'static str,
    pub mood: &'static str,
    pub typography: &'static str,
    pub palette: &'static str,
}

const DIRECTIONS: &[DesignDirection] = &[
    DesignDirection {
        name: "Strategy Ops Room",
        mood: "clean command center, glass panels, dashboard-like but cinematic",
        typography: "Space Grotesk + IBM Plex Sans",
        palette: "ink #0B1020, cyan #22D3EE, mint #34D399, warm #F59E0B",
    },
    DesignDirection {
        name: "Archive Narrative",
        mood: "editorial longform meets mission UI, paper texture and annotation overlays",
        typography: "Source Serif 4 + Inter Tight",
        palette: "parchment #F5EFE2, charcoal #1F2937, brass #B7791F, teal #0F766E",
    },
    DesignDirection {
        name: "Research Theater",
        mood: "lab-style stage with data layers and animated evidence cards",
        typography: "Manrope + JetBrains Mono",
        palette: "night #0F172A, sky #60A5FA, violet #A78BFA, lime #84CC16",
    },
    DesignDirection {
        name: "Economic War Table",
        mood: "map-room energy, tactical chips, timeline and causal map",
        typography: "Sora + IBM Plex Mono",
        palette: "coal #111827, amber #F59E0B, blue #3B82F6, rose #FB7185",
    },
];

const MECHANICS: &[&str] = &[
    "parameter sandbox with 2-4 sliders and instant system response",
    "card sorting or drag grouping of evidence into buckets",
    "timeline switch (before/after) with structural consequences",
    "causal network toggles that reveal hidden dependencies",
    "resource allocation board with trade-off meters",
    "hypothesis test panel with confidence calibration",
];

const MECHANICS_PER_MODULE: usize = 4;

/// Direction plus the four interaction mechanics the renderer must cover.
#[derive(Debug, Clone)]
pub struct DesignChoice {
    pub direction: DesignDirection,
    pub mechanics: Vec<&'static str>,
}

/// Pick a stable design choice for one module.
pub fn design_for(book_title: &str, module_title: &str, module_index: usize) -> DesignChoice {
    let key = format!("{book_title}::{module_title}::{module_index}");
    let direction = *pick_by_hash(DIRECTIONS, &key).unwrap_or(&DIRECTIONS[0]);

    // Rotating window over the mechanics table, seeded separately so
    // direction and mechanics vary independently.
    let start = stable_hash(&format!("{key}:mech")) as usize % MECHANICS.len();
    let mechanics = (0..MECHANICS_PER_MODULE)
        .map(|offset| MECHANICS[(start + offset) % MECHANICS.len()])
        .collect();

    DesignChoice { direction, mechanics }
}
