//! Parsing of scripted build orders given on the command line.

use std::str::FromStr;

use path_defence_core::{CellCoord, TowerKind};
use thiserror::Error;

/// Errors reported for malformed build or upgrade orders.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ScriptError {
    /// The order did not contain the `@` separator.
    #[error("expected `<tower>@<column>,<row>` but found `{0}`")]
    MissingSeparator(String),
    /// The tower name is not in the catalog.
    #[error("unknown tower `{0}`")]
    UnknownTower(String),
    /// The cell was not two comma separated integers.
    #[error("expected `<column>,<row>` but found `{0}`")]
    InvalidCell(String),
}

/// Tower to build on a cell once the session starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BuildOrder {
    pub(crate) kind: TowerKind,
    pub(crate) cell: CellCoord,
}

impl FromStr for BuildOrder {
    type Err = ScriptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (name, cell) = value
            .split_once('@')
            .ok_or_else(|| ScriptError::MissingSeparator(value.to_owned()))?;
        let name = name.trim();
        let kind =
            TowerKind::from_name(name).ok_or_else(|| ScriptError::UnknownTower(name.to_owned()))?;
        Ok(Self {
            kind,
            cell: parse_cell(cell)?,
        })
    }
}

/// Parses `<column>,<row>`.
pub(crate) fn parse_cell(value: &str) -> Result<CellCoord, ScriptError> {
    let invalid = || ScriptError::InvalidCell(value.to_owned());
    let (column, row) = value.split_once(',').ok_or_else(invalid)?;
    let column = column.trim().parse().map_err(|_| invalid())?;
    let row = row.trim().parse().map_err(|_| invalid())?;
    Ok(CellCoord::new(column, row))
}

pub(crate) fn parse_build_order(value: &str) -> Result<BuildOrder, ScriptError> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_orders_name_a_tower_and_a_cell() {
        assert_eq!(
            "machine_gun@4, 6".parse::<BuildOrder>(),
            Ok(BuildOrder {
                kind: TowerKind::MachineGun,
                cell: CellCoord::new(4, 6),
            })
        );
    }

    #[test]
    fn malformed_orders_are_reported() {
        assert_eq!(
            "cannon".parse::<BuildOrder>(),
            Err(ScriptError::MissingSeparator("cannon".to_owned()))
        );
        assert_eq!(
            "railgun@1,1".parse::<BuildOrder>(),
            Err(ScriptError::UnknownTower("railgun".to_owned()))
        );
        assert_eq!(
            parse_cell("1;1"),
            Err(ScriptError::InvalidCell("1;1".to_owned()))
        );
        assert_eq!(
            parse_cell("-1,1"),
            Err(ScriptError::InvalidCell("-1,1".to_owned()))
        );
    }
}
