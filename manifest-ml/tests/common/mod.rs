//! Shared fixtures: a synthetic passenger manifest in the raw layout.

#![allow(dead_code)]

use manifest_core::{ForestConfig, PipelineConfig};
use std::fmt::Write;
use std::path::Path;

/// Rows whose `Age` is left empty.
pub const MISSING_AGE_ROWS: [usize; 3] = [5, 17, 42];
/// Row whose `Embarked` is left empty.
pub const MISSING_EMBARKED_ROW: usize = 61;

pub const RAW_HEADER: &str =
    "PassengerId,Survived,Pclass,Name,Sex,Age,SibSp,Parch,Ticket,Fare,Cabin,Embarked";

/// `n` passengers whose fare bands separate the three classes.
pub fn manifest_csv(n: usize) -> String {
    let mut out = String::from(RAW_HEADER);
    out.push('\n');
    for i in 0..n {
        let pclass = 1 + i % 3;
        let fare = match pclass {
            1 => 80.0 + (i % 10) as f64 * 1.5,
            2 => 20.0 + (i % 5) as f64 * 0.75,
            _ => 7.25 + (i % 3) as f64 * 0.5,
        };
        let age = if MISSING_AGE_ROWS.contains(&i) {
            String::new()
        } else {
            format!("{:.1}", 18.0 + ((i * 7) % 45) as f64 + if i % 4 == 0 { 0.5 } else { 0.0 })
        };
        let embarked = if i == MISSING_EMBARKED_ROW {
            ""
        } else {
            ["S", "C", "S", "Q", "S"][i % 5]
        };
        let cabin = if pclass == 1 { format!("C{}", 10 + i) } else { String::new() };
        let _ = writeln!(
            out,
            "{},{},{},\"Passenger, Mr. Number {}\",{},{},{},{},T-{},{},{},{}",
            i + 1,
            (i / 2) % 2,
            pclass,
            i,
            if i % 2 == 0 { "male" } else { "female" },
            age,
            usize::from(i % 4 == 0),
            if i % 6 == 0 { 2 } else { 0 },
            1000 + i,
            fare,
            cabin,
            embarked
        );
    }
    out
}

/// Write the manifest under `dir` and point a config at `dir`.
pub fn workspace(dir: &Path, rows: usize, trees: usize) -> PipelineConfig {
    let input = dir.join("data").join("raw").join("titanic.csv");
    std::fs::create_dir_all(input.parent().unwrap()).unwrap();
    std::fs::write(&input, manifest_csv(rows)).unwrap();

    let mut config = PipelineConfig::default();
    config.paths.input = input;
    config.paths.processed = dir.join("data").join("processed").join("titanic_processed.csv");
    config.paths.model = dir.join("models").join("titanic_model.json");
    config.forest = ForestConfig {
        n_estimators: trees,
        ..ForestConfig::default()
    };
    config
}
