//! LAMMPS-style atom dump parsing

use std::fs;
use std::path::Path;

use atomshift_core::{AtomPoint, Error, PointSet, Result};

/// One parsed dump snapshot.
///
/// Only the first snapshot of a file is read: an invocation is a one-shot
/// batch computation over a single frame.
#[derive(Debug, Clone)]
pub struct DumpSnapshot {
    /// Timestep of the snapshot
    pub timestep: i64,
    /// Box bounds per axis, `(lo, hi)`
    pub box_bounds: Vec<(f64, f64)>,
    /// Boundary style tail of the `BOX BOUNDS` item line (e.g. `pp pp pp`)
    pub bounds_style: String,
    /// Column names of the `ATOMS` section, as they appeared
    pub columns: Vec<String>,
    /// The atoms, in file order
    pub points: PointSet,
}

/// Read and parse the first snapshot of an atom dump
pub fn read_dump(path: &Path) -> Result<DumpSnapshot> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::dump_parse(path.display().to_string(), e.to_string()))?;
    parse_dump(&path.display().to_string(), &text)
}

/// Parse dump text; `path` is only used for diagnostics
pub fn parse_dump(path: &str, text: &str) -> Result<DumpSnapshot> {
    let mut lines = text.lines().enumerate();

    let err = |line: usize, message: String| Error::dump_parse(path, format!("line {}: {}", line + 1, message));

    let mut next_line = |expect: &str| -> Result<(usize, String)> {
        for (no, raw) in lines.by_ref() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok((no, trimmed.to_string()));
        }
        Err(Error::dump_parse(
            path,
            format!("unexpected end of file, expected {expect}"),
        ))
    };

    let (no, header) = next_line("ITEM: TIMESTEP")?;
    if header != "ITEM: TIMESTEP" {
        return Err(err(no, format!("expected 'ITEM: TIMESTEP', found '{header}'")));
    }
    let (no, value) = next_line("a timestep value")?;
    let timestep: i64 = value
        .parse()
        .map_err(|_| err(no, format!("invalid timestep '{value}'")))?;

    let (no, header) = next_line("ITEM: NUMBER OF ATOMS")?;
    if header != "ITEM: NUMBER OF ATOMS" {
        return Err(err(no, format!("expected 'ITEM: NUMBER OF ATOMS', found '{header}'")));
    }
    let (no, value) = next_line("an atom count")?;
    let n_atoms: usize = value
        .parse()
        .map_err(|_| err(no, format!("invalid atom count '{value}'")))?;
    if n_atoms == 0 {
        return Err(err(no, "dump contains zero atoms".to_string()));
    }

    let (no, header) = next_line("ITEM: BOX BOUNDS")?;
    let bounds_style = header
        .strip_prefix("ITEM: BOX BOUNDS")
        .ok_or_else(|| err(no, format!("expected 'ITEM: BOX BOUNDS', found '{header}'")))?
        .trim()
        .to_string();
    let mut box_bounds = Vec::with_capacity(3);
    for _ in 0..3 {
        let (no, value) = next_line("box bounds")?;
        let mut parts = value.split_whitespace();
        let lo: f64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| err(no, format!("invalid box bound '{value}'")))?;
        let hi: f64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| err(no, format!("invalid box bound '{value}'")))?;
        box_bounds.push((lo, hi));
    }

    let (no, header) = next_line("ITEM: ATOMS")?;
    let columns: Vec<String> = header
        .strip_prefix("ITEM: ATOMS")
        .ok_or_else(|| err(no, format!("expected 'ITEM: ATOMS', found '{header}'")))?
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let layout = ColumnLayout::detect(path, &columns)?;

    let mut atoms = Vec::with_capacity(n_atoms);
    for _ in 0..n_atoms {
        let (no, row) = next_line("an atom row")?;
        atoms.push(layout.parse_row(path, no, &row)?);
    }

    Ok(DumpSnapshot {
        timestep,
        box_bounds,
        bounds_style,
        columns,
        points: PointSet::from_points(atoms)?,
    })
}

/// Column positions for the fields the engine consumes
struct ColumnLayout {
    id: usize,
    species: Option<usize>,
    coords: [usize; 3],
}

impl ColumnLayout {
    /// Locate `id`, optional `type` and one coordinate triple.
    ///
    /// Scaled (`xs ys zs`) and unwrapped (`xu yu zu`) coordinates are
    /// accepted as-is: clustering only cares about relative distances
    /// within one consistent frame.
    fn detect(path: &str, columns: &[String]) -> Result<Self> {
        let find = |name: &str| columns.iter().position(|c| c.as_str() == name);

        let id = find("id")
            .ok_or_else(|| Error::dump_parse(path, "ATOMS section has no 'id' column"))?;
        let species = find("type");

        let coords = ["x", "xs", "xu"]
            .iter()
            .find_map(|&x_name| {
                let (y_name, z_name) = match x_name {
                    "x" => ("y", "z"),
                    "xs" => ("ys", "zs"),
                    _ => ("yu", "zu"),
                };
                Some([find(x_name)?, find(y_name)?, find(z_name)?])
            })
            .ok_or_else(|| {
                Error::dump_parse(path, "ATOMS section has no x/y/z coordinate columns")
            })?;

        Ok(Self { id, species, coords })
    }

    fn parse_row(&self, path: &str, line: usize, row: &str) -> Result<AtomPoint> {
        let fields: Vec<&str> = row.split_whitespace().collect();
        let field = |col: usize| -> Result<&str> {
            fields.get(col).copied().ok_or_else(|| {
                Error::dump_parse(path, format!("line {}: atom row has too few columns", line + 1))
            })
        };

        let id: i64 = field(self.id)?.parse().map_err(|_| {
            Error::dump_parse(path, format!("line {}: invalid atom id", line + 1))
        })?;
        let species: u32 = match self.species {
            Some(col) => field(col)?.parse().map_err(|_| {
                Error::dump_parse(path, format!("line {}: invalid atom type", line + 1))
            })?,
            None => 1,
        };
        let mut coords = Vec::with_capacity(3);
        for &col in &self.coords {
            let value: f64 = field(col)?.parse().map_err(|_| {
                Error::dump_parse(path, format!("line {}: invalid coordinate", line + 1))
            })?;
            coords.push(value);
        }

        Ok(AtomPoint { id, species, coords })
    }
}
