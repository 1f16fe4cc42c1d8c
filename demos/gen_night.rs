//! Generate one mock night and print its stage breakdown

use chrono::{NaiveDate, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use synheart_mock::encoder::SleepView;
use synheart_mock::sleep::{generate_night, summarize};
use synheart_mock::types::RawStageInterval;
use synheart_mock::DayWindow;

fn main() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default();
    let window = match DayWindow::for_date(date, &Utc) {
        Ok(window) => window,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let samples = match generate_night(&window, 480.0, &mut rng) {
        Ok(samples) => samples,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    for sample in &samples {
        println!(
            "{}  {}  {:>6.1} min",
            sample.start.format("%H:%M:%S"),
            sample.stage().display_name(),
            sample.minutes()
        );
    }

    let intervals: Vec<RawStageInterval> = samples.iter().map(RawStageInterval::from).collect();
    if let Some(summary) = summarize(&intervals) {
        match serde_json::to_string_pretty(&SleepView::from(&summary)) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: {e:?}"),
        }
    }
}
