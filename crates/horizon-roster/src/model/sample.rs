//! The demo roster used by examples and tests.

use super::record::Record;

/// Six people, in display order.
pub fn sample_records() -> Vec<Record> {
    vec![
        Record::new("Ivy", "Brown", 22, true),
        Record::new("Tim", "Berners-Lee", 25, false),
        Record::new("James", "Gosling", 99, true),
        Record::new("Grace", "Hopper", 34, false),
        Record::new("Ada", "Lovelace", 20, true),
        Record::new("Robert", "Martin", 19, false),
    ]
}
