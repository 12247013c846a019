//! ## reactorsim-core::layout
//! **Validated reactor grids**
//!
//! A reactor is always 6 rows tall and 3 to 9 columns wide (three base
//! columns plus up to six extra chambers). Layouts are built either from a
//! flat row-major list of codes or from the whitespace separated grid text
//! format:
//!
//! ```text
//! U4 VO VO
//! VO U4 VO
//! ...
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::catalog::{parse_code, slot_code, ComponentKind};
use crate::error::LayoutError;

/// Rows in every reactor.
pub const HEIGHT: usize = 6;
/// Columns of a reactor without extra chambers.
pub const BASE_WIDTH: usize = 3;
/// Maximum number of extra chambers.
pub const MAX_EXTRA_CHAMBERS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

/// Grid size for a reactor with `extra_chambers` chambers attached.
pub fn dimensions(extra_chambers: usize) -> Dimensions {
    Dimensions {
        width: BASE_WIDTH + extra_chambers,
        height: HEIGHT,
    }
}

impl Dimensions {
    /// Checked variant of [`dimensions`].
    pub fn for_chambers(extra_chambers: usize) -> Result<Self, LayoutError> {
        if extra_chambers > MAX_EXTRA_CHAMBERS {
            return Err(LayoutError::InvalidChambers(extra_chambers));
        }
        Ok(dimensions(extra_chambers))
    }

    /// Dimensions matching a flat list of `count` slots.
    pub fn for_component_count(count: usize) -> Result<Self, LayoutError> {
        let min = BASE_WIDTH * HEIGHT;
        let max = (BASE_WIDTH + MAX_EXTRA_CHAMBERS) * HEIGHT;
        if count % HEIGHT != 0 || !(min..=max).contains(&count) {
            return Err(LayoutError::InvalidComponentCount(count));
        }
        Ok(Dimensions {
            width: count / HEIGHT,
            height: HEIGHT,
        })
    }

    pub fn extra_chambers(&self) -> usize {
        self.width - BASE_WIDTH
    }

    pub fn slot_count(&self) -> usize {
        self.width * self.height
    }
}

/// A validated, row-major reactor grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    dims: Dimensions,
    slots: Vec<Option<ComponentKind>>,
}

impl Layout {
    /// An empty reactor with the given number of extra chambers.
    pub fn empty(extra_chambers: usize) -> Result<Self, LayoutError> {
        let dims = Dimensions::for_chambers(extra_chambers)?;
        Ok(Self {
            dims,
            slots: vec![None; dims.slot_count()],
        })
    }

    /// Builds a layout from a flat row-major list of codes.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Result<Self, LayoutError> {
        let dims = Dimensions::for_component_count(codes.len())?;
        let slots = codes
            .iter()
            .map(|code| parse_code(code.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { dims, slots })
    }

    /// Parses the grid text format: one row per non-blank line, codes
    /// separated by spaces or tabs.
    pub fn parse_grid(text: &str) -> Result<Self, LayoutError> {
        let mut slots = Vec::new();
        let mut width = None;
        let mut rows = 0;

        for line in text.lines() {
            let tokens: Vec<&str> = line
                .split([' ', '\t'])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect();
            if tokens.is_empty() {
                continue;
            }
            let expected = *width.get_or_insert(tokens.len());
            if tokens.len() != expected {
                return Err(LayoutError::RaggedRow {
                    row: rows,
                    found: tokens.len(),
                    expected,
                });
            }
            for token in tokens {
                slots.push(parse_code(token)?);
            }
            rows += 1;
        }

        if rows != HEIGHT {
            return Err(LayoutError::InvalidRowCount {
                found: rows,
                expected: HEIGHT,
            });
        }
        let dims = Dimensions::for_component_count(slots.len())?;
        Ok(Self { dims, slots })
    }

    /// Reads and parses a grid file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LayoutError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse_grid(&content)
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn slots(&self) -> &[Option<ComponentKind>] {
        &self.slots
    }

    /// Component at `(x, y)`; `None` for empty or out of range.
    pub fn get(&self, x: usize, y: usize) -> Option<ComponentKind> {
        if x >= self.dims.width || y >= self.dims.height {
            return None;
        }
        self.slots[y * self.dims.width + x]
    }

    /// Places (or clears) a component, rejecting slots outside the grid.
    pub fn try_set(
        &mut self,
        x: usize,
        y: usize,
        kind: Option<ComponentKind>,
    ) -> Result<(), LayoutError> {
        let Dimensions { width, height } = self.dims;
        if x >= width || y >= height {
            return Err(LayoutError::SlotOutOfRange {
                x,
                y,
                width,
                height,
            });
        }
        self.slots[y * width + x] = kind;
        Ok(())
    }

    /// Places (or clears) a component. Meant for hand-built layouts with
    /// known coordinates; use [`Layout::try_set`] for anything else.
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the grid.
    pub fn set(&mut self, x: usize, y: usize, kind: Option<ComponentKind>) {
        if let Err(e) = self.try_set(x, y, kind) {
            panic!("{e}");
        }
    }

    /// Builder-style [`Layout::set`].
    pub fn with(mut self, x: usize, y: usize, kind: ComponentKind) -> Self {
        self.set(x, y, Some(kind));
        self
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| slot_code(*s)).collect()
    }

    pub fn component_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Stable BLAKE3 digest of the grid, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Hasher::new();
        hasher.update(&(self.dims.width as u32).to_le_bytes());
        for code in self.codes() {
            hasher.update(code.as_bytes());
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_grid(s)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.slots.chunks(self.dims.width) {
            let line: Vec<&str> = row.iter().map(|s| slot_code(*s)).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
