// src/models/page.rs

//! Page types and their extraction layouts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The committee pages published by the council.
///
/// The tag string (`as_str`) feeds into event identifiers, so renaming a
/// variant changes every UID derived from that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    FullCouncil,
    Planning,
    ExtraordinaryCouncil,
    Finance,
    PlayingFields,
    RightsOfWay,
}

impl PageKind {
    /// Every page kind, in the order the site lists them.
    pub const ALL: [PageKind; 6] = [
        PageKind::FullCouncil,
        PageKind::Planning,
        PageKind::ExtraordinaryCouncil,
        PageKind::Finance,
        PageKind::PlayingFields,
        PageKind::RightsOfWay,
    ];

    /// Stable tag used in identifiers and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::FullCouncil => "full-council",
            PageKind::Planning => "planning",
            PageKind::ExtraordinaryCouncil => "extraordinary-council",
            PageKind::Finance => "finance",
            PageKind::PlayingFields => "playing-fields",
            PageKind::RightsOfWay => "rights-of-way",
        }
    }

    /// Human-readable committee name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PageKind::FullCouncil => "Full Council",
            PageKind::Planning => "Planning",
            PageKind::ExtraordinaryCouncil => "Extra Ordinary Council",
            PageKind::Finance => "Finance, Staffing, General Purposes & Audit",
            PageKind::PlayingFields => "Playing Fields",
            PageKind::RightsOfWay => "Rights of Way",
        }
    }

    /// Path of the page relative to the site root.
    pub fn default_path(&self) -> &'static str {
        match self {
            PageKind::FullCouncil => "/Full_Council_24620.aspx",
            PageKind::Planning => "/Planning_24621.aspx",
            PageKind::ExtraordinaryCouncil => "/Extra_Ordinary_Council_Meeting_30589.aspx",
            PageKind::Finance => "/Finance_Staffing_General_Purposes__and__Audit_24623.aspx",
            PageKind::PlayingFields => "/Playing_Fields_24624.aspx",
            PageKind::RightsOfWay => "/Rights_of_Way_24622.aspx",
        }
    }

    /// Layout the page is published with.
    pub fn default_layout(&self) -> PageLayout {
        PageLayout::Minutes
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTML structures a meeting listing can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageLayout {
    /// One `div.minutes` block per meeting: `h4` date, first `p` time, anchors.
    Minutes,
    /// One table row per meeting: date, time, optional title and location cells.
    Table,
}

/// A page to scrape, as listed in the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page type tag
    pub kind: PageKind,

    /// Path relative to the base URL (defaults to the kind's known path)
    #[serde(default)]
    pub path: Option<String>,

    /// Override for the page's layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<PageLayout>,

    /// Override for the meeting title used when the page carries none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PageConfig {
    /// Page entry with the kind's defaults.
    pub fn new(kind: PageKind) -> Self {
        Self {
            kind,
            path: None,
            layout: None,
            title: None,
        }
    }

    /// Relative path of the page.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or_else(|| self.kind.default_path())
    }

    /// Effective extraction layout.
    pub fn layout(&self) -> PageLayout {
        self.layout.unwrap_or_else(|| self.kind.default_layout())
    }

    /// Meeting title for records without their own, e.g. `St Mewan Parish - Planning Meeting`.
    pub fn meeting_title(&self, prefix: &str) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => format!("{prefix}{} Meeting", self.kind.display_name()),
        }
    }
}
