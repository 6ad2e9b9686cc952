//! A tour of lazy pipelines and collectors.

use std::collections::BTreeMap;

use lazyweld::prelude::*;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Clone)]
struct Student {
    name: &'static str,
    grade: f64,
}

fn students() -> Vec<Student> {
    vec![
        Student { name: "Ada", grade: 91.5 },
        Student { name: "Brian", grade: 58.0 },
        Student { name: "Claude", grade: 74.0 },
        Student { name: "Dennis", grade: 42.5 },
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Intermediate Stages ===");
    let words = vec!["I", "love", "you", "too", "love"];
    let shouted = Pipeline::from_vec(words.clone())
        .distinct()
        .filter(|w| w.len() > 1)
        .map(|w| w.to_uppercase())
        .collect(collectors::joining_full(", ", "[", "]"))?;
    println!("distinct shouted: {}", shouted);

    let window = Pipeline::range(1..100)
        .tap(|n| println!("  pulled {}", n))
        .skip(2)
        .limit(3)
        .to_vec()?;
    println!("skip(2).limit(3): {:?}\n", window);

    println!("=== Reductions ===");
    let total = Pipeline::from_vec(words.clone()).fold_with(0, |acc, w| acc + w.len(), |a, b| a + b)?;
    let longest = Pipeline::from_vec(words.clone()).reduce(|a, b| if b.len() > a.len() { b } else { a })?;
    println!("total length {}, longest {:?}\n", total, longest);

    println!("=== Collectors ===");
    let grades = Pipeline::from_vec(students())
        .collect(collectors::to_map(|s: &Student| s.name, |s: Student| s.grade))?;
    let grades: BTreeMap<_, _> = grades.into_iter().collect();
    println!("grades: {:?}", grades);

    let passing = Pipeline::from_vec(students()).collect(collectors::partitioning_by(
        |s: &Student| s.grade >= 60.0,
        collectors::mapping(|s: Student| s.name, collectors::to_list()),
    ))?;
    println!("passing: {:?}", passing);

    let by_length = Pipeline::from_vec(words)
        .collect(collectors::grouping_by(|w: &&str| w.len(), collectors::counting()))?;
    let by_length: BTreeMap<_, _> = by_length.into_iter().collect();
    println!("words per length: {:?}\n", by_length);

    println!("=== Parallel Evaluation ===");
    let squares = Pipeline::range(0..1_000_000)
        .parallel()
        .map(|n| n * n % 1_000)
        .distinct()
        .sorted()
        .limit(5)
        .to_vec()?;
    println!("smallest distinct square residues: {:?}\n", squares);

    println!("=== Async Source ===");
    let (tx, rx) = tokio::sync::mpsc::channel(16);
    tokio::spawn(async move {
        for n in 1..=10u32 {
            if tx.send(n).await.is_err() {
                break;
            }
        }
    });
    let evens = Pipeline::from_async(StreamSource::new(ReceiverStream::new(rx)))
        .demand_batch_size(4)
        .filter(|n| n % 2 == 0)
        .to_vec_async()
        .await?;
    println!("evens from channel: {:?}", evens);

    Ok(())
}
