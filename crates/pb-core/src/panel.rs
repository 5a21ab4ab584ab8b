//! Panel key index
//!
//! A panel is a DataFrame whose rows are uniquely keyed by an
//! (entity, time) pair. `PanelIndex` validates that key, assigns each row
//! an entity code and keeps the row groups the within estimator demeans over.

use std::collections::{HashMap, HashSet};

use crate::data::{DataError, DataFrame, Result};


/// Row-to-entity mapping for a validated panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelIndex {
    entity_col: String,
    time_col: String,
    /// Entity labels in order of first appearance
    entities: Vec<String>,
    /// Entity code of every row
    codes: Vec<usize>,
    /// Row positions per entity code
    groups: Vec<Vec<usize>>,
    /// Row positions per entity code, sorted by time
    time_ordered: Vec<Vec<usize>>,
    n_periods: usize,
}

impl PanelIndex {
    /// Build the index, rejecting missing keys and duplicated (entity, time) pairs
    pub fn build(df: &DataFrame, entity_col: &str, time_col: &str) -> Result<Self> {
        if entity_col == time_col {
            return Err(DataError::InvalidParameter(format!(
                "entity and time columns must differ, both are '{}'",
                entity_col
            )));
        }

        let entity_keys = df.keys(entity_col)?;
        let time_keys = df.keys(time_col)?;

        let mut entities: Vec<String> = Vec::new();
        let mut lookup: HashMap<String, usize> = HashMap::new();
        let mut codes = Vec::with_capacity(df.nrows());
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut seen: HashSet<(usize, &str)> = HashSet::with_capacity(df.nrows());
        let mut periods: HashSet<&str> = HashSet::new();

        for (row, (entity, time)) in entity_keys.iter().zip(time_keys.iter()).enumerate() {
            let entity = entity
                .as_ref()
                .ok_or_else(|| DataError::MissingData(entity_col.to_string()))?;
            let time = time
                .as_deref()
                .ok_or_else(|| DataError::MissingData(time_col.to_string()))?;

            let code = match lookup.get(entity) {
                Some(&code) => code,
                None => {
                    let code = entities.len();
                    lookup.insert(entity.clone(), code);
                    entities.push(entity.clone());
                    groups.push(Vec::new());
                    code
                }
            };

            if !seen.insert((code, time)) {
                return Err(DataError::DuplicateKey {
                    entity_col: entity_col.to_string(),
                    time_col: time_col.to_string(),
                    entity: entity.clone(),
                    time: time.to_string(),
                });
            }

            periods.insert(time);
            codes.push(code);
            groups[code].push(row);
        }

        // Numeric time sorts by value, anything else by its key text
        let numeric_time = df.float_column(time_col).ok();
        let mut time_ordered = groups.clone();
        for rows in &mut time_ordered {
            match &numeric_time {
                Some(times) => rows.sort_by(|&a, &b| times[a].total_cmp(&times[b])),
                None => rows.sort_by(|&a, &b| time_keys[a].cmp(&time_keys[b])),
            }
        }

        Ok(Self {
            entity_col: entity_col.to_string(),
            time_col: time_col.to_string(),
            entities,
            codes,
            groups,
            time_ordered,
            n_periods: periods.len(),
        })
    }

    /// Name of the entity column
    pub fn entity_col(&self) -> &str {
        &self.entity_col
    }

    /// Name of the time column
    pub fn time_col(&self) -> &str {
        &self.time_col
    }

    /// Number of indexed rows
    pub fn n_obs(&self) -> usize {
        self.codes.len()
    }

    /// Number of distinct entities
    pub fn n_entities(&self) -> usize {
        self.entities.len()
    }

    /// Number of distinct time periods
    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    /// Entity labels, indexed by entity code
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Entity code of every row
    pub fn codes(&self) -> &[usize] {
        &self.codes
    }

    /// Row positions grouped by entity code
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Row positions grouped by entity code, each group in time order
    pub fn time_ordered_groups(&self) -> &[Vec<usize>] {
        &self.time_ordered
    }

    /// Whether every entity is observed in every period
    pub fn is_balanced(&self) -> bool {
        self.groups.iter().all(|g| g.len() == self.n_periods)
    }

    /// Rows whose entity has at least `min_periods` observations, and the
    /// labels of the entities that fall short
    pub fn rows_with_min_periods(&self, min_periods: usize) -> (Vec<bool>, Vec<String>) {
        let short: Vec<bool> = self.groups.iter().map(|g| g.len() < min_periods).collect();
        let mask = self.codes.iter().map(|&c| !short[c]).collect();
        let excluded = self
            .entities
            .iter()
            .zip(short.iter())
            .filter(|(_, short)| **short)
            .map(|(label, _)| label.clone())
            .collect();
        (mask, excluded)
    }
}
