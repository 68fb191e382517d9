use std::sync::LazyLock;

use crate::error::{Result, StrataError};

/// Line that starts the forward body.
pub const UP_MARKER: &str = "-- migrate up";

/// Line that starts the backward body.
pub const DOWN_MARKER: &str = "-- migrate down";

static IDENTIFIER_PREFIX: LazyLock<regex_lite::Regex> =
    LazyLock::new(|| regex_lite::Regex::new(r"^\d+").unwrap());

/// One versioned unit of schema change, parsed from a packaged script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeScript {
    identifier: i64,
    name: String,
    up: String,
    down: String,
}

impl ChangeScript {
    /// Parse a script resource.
    ///
    /// `name` is the resource path (`<group>/<digits>-<description>.sql`); the
    /// identifier comes from the leading digits of its base filename.
    pub fn parse(name: impl Into<String>, contents: &str) -> Result<Self> {
        let name = name.into();
        let identifier = parse_identifier(&name)?;

        let sections = split_sections(contents);
        if !sections.has_up {
            return Err(StrataError::Config(format!(
                "migration '{}' has no '{}' section",
                name, UP_MARKER
            )));
        }

        Ok(Self {
            identifier,
            name,
            up: sections.up,
            down: sections.down,
        })
    }

    /// Ordering key, unique within a migration set.
    pub fn identifier(&self) -> i64 {
        self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// SQL that moves the schema forward.
    pub fn up(&self) -> &str {
        &self.up
    }

    /// SQL that reverts this change. Kept for manual use, never run automatically.
    pub fn down(&self) -> &str {
        &self.down
    }

    pub fn has_down(&self) -> bool {
        !self.down.trim().is_empty()
    }
}

/// Extract the numeric identifier from a resource name's base filename.
pub fn parse_identifier(name: &str) -> Result<i64> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    IDENTIFIER_PREFIX
        .find(base)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| StrataError::InvalidMigrationName {
            name: name.to_string(),
        })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Up,
    Down,
}

struct Sections {
    up: String,
    down: String,
    has_up: bool,
}

/// Split a script into its forward and backward bodies.
///
/// Every non-marker line is appended, newline-prefixed, to the active body. Lines
/// before the first marker are dropped. No statement splitting happens here.
fn split_sections(contents: &str) -> Sections {
    let mut sections = Sections {
        up: String::new(),
        down: String::new(),
        has_up: false,
    };
    let mut current = Section::None;

    for line in contents.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        match line {
            UP_MARKER => {
                current = Section::Up;
                sections.has_up = true;
            }
            DOWN_MARKER => current = Section::Down,
            _ => {
                let body = match current {
                    Section::Up => &mut sections.up,
                    Section::Down => &mut sections.down,
                    Section::None => continue,
                };
                body.push('\n');
                body.push_str(line);
            }
        }
    }

    sections
}
