/// Level catalog with pack support.
///
/// ## Sources (priority order):
///   1. Level pack file named by `general.level_pack` in config
///   2. Built-in embedded levels
///
/// ## Pack format (`.skp`, sokoterm level pack):
///   ```text
///   ## Pack Name
///   ## Author: name
///   ---
///   # Level 1 - Name
///   <map rows>
///   ---
///   # Level 2 - Name
///   <map rows>
///   ```
///
/// Levels are separated by a line containing only `---`.
/// Pack metadata lines start with `##` and precede the first `---`.
///
/// ## Map legend (pack files):
///   '#' = Wall        '.' = Goal
///   '$' = Box         '*' = Box on goal
///   '@' = Player      '+' = Player on goal
///   ' ', '-', '_' = Floor
///
/// Embedded levels keep terrain and tokens in two separate grids instead:
/// terrain uses `#`/`G`/space, tokens use `@`/`B`/space.

use std::path::Path;

use crate::config::GameConfig;
use crate::domain::grid::{self, Grid};
use crate::domain::tile::{split_cell, Tile, Token};
use crate::error::LevelError;

/// One immutable level: terrain plus the starting token layout.
#[derive(Clone, Debug)]
pub struct LevelDef {
    name: String,
    terrain: Grid<Tile>,
    initial: Grid<Token>,
}

impl LevelDef {
    pub fn new(name: impl Into<String>, terrain: Grid<Tile>, initial: Grid<Token>) -> Self {
        LevelDef { name: name.into(), terrain, initial }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn terrain(&self) -> &Grid<Tile> {
        &self.terrain
    }

    pub fn initial(&self) -> &Grid<Token> {
        &self.initial
    }

    /// Shape, player and goal/box checks. Returns the reason on failure.
    fn validate(&self) -> Result<(), String> {
        if !self.terrain.same_shape(&self.initial) {
            return Err(format!(
                "terrain is {:?} but tokens are {:?}",
                self.terrain.dims(),
                self.initial.dims(),
            ));
        }
        let players = self.initial.count(Token::Player);
        if players != 1 {
            return Err(format!("expected exactly one player, found {players}"));
        }
        // A level with no goals would count as solved after the first step.
        let goals = self.terrain.count(Tile::Goal);
        if goals == 0 {
            return Err("level has no goals".into());
        }
        let boxes = self.initial.count(Token::Box);
        if boxes < goals {
            return Err(format!("{goals} goals but only {boxes} boxes"));
        }
        Ok(())
    }
}

/// Ordered, read-only sequence of levels.
#[derive(Debug)]
pub struct Catalog {
    name: String,
    levels: Vec<LevelDef>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

impl Catalog {
    /// Validate every level up front; a bad level is a configuration error.
    pub fn new(name: impl Into<String>, levels: Vec<LevelDef>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::MalformedLevel { level: 0, reason: "catalog has no levels".into() });
        }
        for (level, def) in levels.iter().enumerate() {
            def.validate()
                .map_err(|reason| LevelError::MalformedLevel { level, reason })?;
        }
        Ok(Catalog { name: name.into(), levels })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn get(&self, index: usize) -> Result<&LevelDef, LevelError> {
        self.levels.get(index).ok_or(LevelError::IndexOutOfRange {
            index,
            count: self.levels.len(),
        })
    }

    /// The levels shipped with the game.
    pub fn embedded() -> Result<Self, LevelError> {
        let levels = EMBEDDED
            .iter()
            .enumerate()
            .map(|(i, (terrain, tokens))| make_embedded(i, terrain, tokens))
            .collect::<Result<Vec<_>, _>>()?;
        Catalog::new("Built-in Levels", levels)
    }

    /// Parse a whole pack file's contents.
    pub fn from_pack(content: &str) -> Result<Self, LevelError> {
        let name = parse_pack_name(content).unwrap_or_else(|| "Unnamed Pack".to_string());
        let levels = parse_pack_levels(content)?;
        Catalog::new(name, levels)
    }

    /// Pick the catalog for this run: the configured pack if it loads,
    /// otherwise the embedded levels.
    pub fn load(config: &GameConfig) -> Result<Self, LevelError> {
        if let Some(path) = &config.level_pack {
            match load_pack_file(path) {
                Ok(catalog) => {
                    log::info!(
                        "loaded pack '{}' ({} levels) from {}",
                        catalog.name, catalog.level_count(), path.display(),
                    );
                    return Ok(catalog);
                }
                Err(e) => log::error!("level pack {} unusable, using built-in levels: {e}", path.display()),
            }
        }
        let catalog = Catalog::embedded()?;
        log::info!("using {} built-in levels", catalog.level_count());
        Ok(catalog)
    }
}

fn load_pack_file(path: &Path) -> Result<Catalog, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(Catalog::from_pack(&content)?)
}

// ══════════════════════════════════════════════════════════════
// Pack parsing
// ══════════════════════════════════════════════════════════════

/// First `##` line before the first `---`, minus `## Author:` style keys.
fn parse_pack_name(content: &str) -> Option<String> {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed == "---" {
            break;
        }
        if let Some(rest) = trimmed.strip_prefix("##") {
            let rest = rest.trim();
            if !rest.is_empty() && !rest.contains(':') {
                return Some(rest.to_string());
            }
        }
    }
    None
}

/// Parse all levels from a pack file.
fn parse_pack_levels(content: &str) -> Result<Vec<LevelDef>, LevelError> {
    let mut sections: Vec<String> = vec![];
    let mut current = String::new();
    let mut in_levels = false;

    for line in content.lines() {
        if line.trim() == "---" {
            if in_levels && !current.trim().is_empty() {
                sections.push(std::mem::take(&mut current));
            }
            current.clear();
            in_levels = true;
            continue;
        }
        // Skip pack metadata before the first ---
        if !in_levels {
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        sections.push(current);
    }

    sections
        .iter()
        .enumerate()
        .map(|(i, s)| parse_level_section(i, s))
        .collect()
}

/// Parse one `---`-delimited section into a level.
fn parse_level_section(index: usize, content: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        if name.is_empty() && rows.iter().all(|r| r.trim().is_empty()) && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.trim_end_matches('\r'));
        }
    }

    while rows.first().is_some_and(|r| r.trim().is_empty()) {
        rows.remove(0);
    }
    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    if name.is_empty() {
        name = format!("Level {}", index + 1);
    }

    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut terrain = Vec::with_capacity(rows.len());
    let mut tokens = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut t_row = Vec::with_capacity(width);
        let mut d_row = Vec::with_capacity(width);
        let padded = row.chars().chain(std::iter::repeat(' ')).take(width);
        for c in padded {
            let (tile, token) = split_cell(c).ok_or_else(|| LevelError::MalformedLevel {
                level: index,
                reason: format!("unknown map character {c:?}"),
            })?;
            t_row.push(tile);
            d_row.push(token);
        }
        terrain.push(t_row);
        tokens.push(d_row);
    }

    // Padding makes both grids rectangular, so from_rows cannot fail here.
    let ragged = || LevelError::MalformedLevel { level: index, reason: "ragged rows".into() };
    let terrain = Grid::from_rows(terrain).ok_or_else(ragged)?;
    let tokens = Grid::from_rows(tokens).ok_or_else(ragged)?;
    Ok(LevelDef::new(name, terrain, tokens))
}

/// Distinguish `# Level Name` from `#######` (map data).
/// A name line starts with `#` and contains at least one letter.
fn is_name_line(line: &str) -> bool {
    line.starts_with('#') && line[1..].chars().any(|c| c.is_alphabetic())
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

fn make_embedded(index: usize, terrain: &[&str], tokens: &[&str]) -> Result<LevelDef, LevelError> {
    let malformed = |reason: String| LevelError::MalformedLevel { level: index, reason };

    let terrain = grid::parse_rows(terrain, Tile::from_char)
        .map_err(|c| malformed(format!("unknown terrain character {c:?}")))?
        .ok_or_else(|| malformed("ragged terrain rows".into()))?;
    let tokens = grid::parse_rows(tokens, Token::from_char)
        .map_err(|c| malformed(format!("unknown token character {c:?}")))?
        .ok_or_else(|| malformed("ragged token rows".into()))?;

    Ok(LevelDef::new(format!("Level {}", index + 1), terrain, tokens))
}

/// (terrain, tokens) per level.
const EMBEDDED: &[(&[&str], &[&str])] = &[
    (
        &["######", "#    #", "#   G#", "# G  #", "######"],
        &["      ", " @    ", "   B  ", "   B  ", "      "],
    ),
    (
        &["####### ", "#     ##", "#      #", "# #G  G#", "#      #", "########"],
        &["        ", " @      ", "  BB    ", "        ", "        ", "        "],
    ),
    (
        &["  #### ", "###  ##", "#  G  #", "#     #", "# #G  #", "#     #", "#######"],
        &["       ", "       ", " @  B  ", "    B  ", "       ", "       ", "       "],
    ),
    (
        &[" ##### ", "##   ##", "#  #  #", "#  G  #", "#  G  #", "#  G  #", "#######"],
        &["       ", "  @    ", "       ", "  BBB  ", "       ", "       ", "       "],
    ),
    (
        &["######  ", "#    ###", "#   GG #", "#      #", "#  # G #", "########"],
        &["        ", "        ", "        ", "  BBB@  ", "        ", "        "],
    ),
];
