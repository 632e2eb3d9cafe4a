use std::fmt::Write as _;

use proptest::prelude::*;
use wbs_model::{ProcessDefinition, TimeRatios, WbsDocument};

const PEOPLE: [&str; 4] = ["alice", "bob", "carol", "dave"];

fn process() -> ProcessDefinition {
    ProcessDefinition::new("TSP")
        .with_construction_phases("LOC", ["Code", "Design"])
        .with_all_construction_phases(["Code", "Design", "Test"])
}

/// One component holding a task per (phase, allocation) pair
fn dump(tasks: &[(usize, Vec<u32>)]) -> String {
    let phases = ["Code", "Design", "Test", "Planning"];
    let mut xml = String::from(r#"<project><component name="Widget" id="1" sizeUnits="LOC">"#);
    for (i, (phase, amounts)) in tasks.iter().enumerate() {
        let mut time = String::from(",");
        for (who, amount) in PEOPLE.iter().zip(amounts) {
            let _ = write!(time, "{who}={amount},");
        }
        let _ = write!(
            xml,
            r#"<task name="T{i}" id="t{i}" phaseName="{}" time="{time}"/>"#,
            phases[*phase % phases.len()]
        );
    }
    xml.push_str("</component></project>");
    xml
}

#[test]
fn test_no_time_anywhere_gives_zero() {
    let doc = WbsDocument::parse(&dump(&[])).unwrap();
    let process = process();
    let mut ratios = TimeRatios::new(&doc, &process);
    let widget = doc.children(doc.root())[0];
    for who in PEOPLE {
        assert_eq!(ratios.ratio(widget, "LOC", who), 0.0);
    }
}

proptest! {
    #[test]
    fn prop_ratios_are_bounded_and_sum_to_one(
        tasks in prop::collection::vec(
            (0usize..4, prop::collection::vec(0u32..40, PEOPLE.len())),
            0..8,
        )
    ) {
        let doc = WbsDocument::parse(&dump(&tasks)).unwrap();
        let process = process();
        let mut ratios = TimeRatios::new(&doc, &process);
        let widget = doc.children(doc.root())[0];

        let shares: Vec<f64> = PEOPLE
            .iter()
            .map(|who| ratios.ratio(widget, "LOC", who))
            .collect();
        for share in &shares {
            prop_assert!((0.0..=1.0).contains(share));
        }

        let sum: f64 = shares.iter().sum();
        prop_assert!(sum.abs() < 1e-9 || (sum - 1.0).abs() < 1e-9);

        let any_time = tasks.iter().any(|(phase, amounts)| *phase < 3 && amounts.iter().any(|a| *a > 0));
        if any_time {
            prop_assert!((sum - 1.0).abs() < 1e-9);
        }
    }
}
