//! Twist the dual arc of `a0` on the flute and watch the weights grow.
//!
//! Purpose
//! - A runnable smoke check of the whole pipeline: surface loading, finite and
//!   localized twists, shortening and intersection numbers.
//!
//! Run with `cargo run -p bigger --example flute_twist`.

use std::time::Instant;

use bigger::api::{flute, Side};

fn main() {
    let mcg = flute();
    let t = mcg.triangulation().clone();
    let arc = t.lamination_from_weights([(1, -1)]);

    let start = Instant::now();
    let mut image = arc.clone();
    for k in 1..=5 {
        image = mcg.apply("a0", &image).expect("a0 is a flute generator");
        println!("a0^{k}(arc) = {image}");
    }
    println!("finite twists: {:.2} ms", start.elapsed().as_secs_f64() * 1e3);

    let start = Instant::now();
    let arcs = t.lamination_from_weights((0..20).map(|n| (3 * n + 1, -1)));
    let all = mcg.apply("a", &arcs).expect("a is a flute generator");
    println!("a(arcs) has complexity {}", all.complexity().expect("finite"));
    println!("localized twist: {:.2} ms", start.elapsed().as_secs_f64() * 1e3);

    let a0 = t.lamination_from_weights([(1, 1), (2, 1)]);
    let i = a0.intersection(&image).expect("a0 is a curve");
    println!("i(a0, a0^5(arc)) = {i}");

    let hidden = t.flip_side(&Side::pos(3)).apply(&t.lamination_from_weights([(4, 1), (5, 1)]));
    let short = hidden.shorten().expect("a1 is shortenable");
    println!(
        "shortened {hidden} to {} with {} flip(s)",
        short.lamination,
        short.conjugator.len()
    );
}
