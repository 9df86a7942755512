use std::process::ExitCode;
use std::time::Instant;

use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};
use vow_collider::{
    config, report, Aligner, ChainHash, Collider, Error, HashVariant, Params, Sha2,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Error> {
    let params = Params::default();
    println!(
        "Selected device: host CPU pool ({} cores)",
        num_cpus::get()
    );
    match config::VARIANT {
        HashVariant::Sha224 => collide(config::VARIANT, Sha2::<Sha224>::new(), params),
        HashVariant::Sha256 => collide(config::VARIANT, Sha2::<Sha256>::new(), params),
        HashVariant::Sha384 => collide(config::VARIANT, Sha2::<Sha384>::new(), params),
        HashVariant::Sha512 => collide(config::VARIANT, Sha2::<Sha512>::new(), params),
        HashVariant::Sha512_224 => collide(config::VARIANT, Sha2::<Sha512_224>::new(), params),
        HashVariant::Sha512_256 => collide(config::VARIANT, Sha2::<Sha512_256>::new(), params),
    }
}

fn collide<H: ChainHash>(variant: HashVariant, hash: H, params: Params) -> Result<(), Error> {
    println!(
        "Starting VOW partial collision search on {} with n = {} and k = {}",
        variant.name(),
        params.n,
        params.k
    );
    println!("Prefix: {}", hex::encode(&params.prefix));
    println!("Suffix: {}", hex::encode(&params.suffix));

    let start = Instant::now();
    let mut collider = Collider::new(hash, params.clone())?;
    let stage_one = collider.run(report::batch_printer(params.n))?;
    let stage1_secs = start.elapsed().as_secs_f64();
    println!(
        "Stage 1 ended in {:.2} s ({:.0} hashes per second)",
        stage1_secs,
        stage_one.total_hashes as f64 / stage1_secs.max(1e-9)
    );

    let Some(collision) = stage_one.collision else {
        println!(
            "no collision within budget ({} batches, {} hashes)",
            stage_one.batches, stage_one.total_hashes
        );
        return Ok(());
    };

    println!();
    println!("Stage 1 ended with the following DP collision:");
    println!("DP collided: {}", hex::encode(&collision.dp_digest));
    println!(
        "X ({} steps before the DP): {}",
        collision.x_steps,
        hex::encode(&collision.x)
    );
    println!(
        "Y ({} steps before the DP): {}",
        collision.y_steps,
        hex::encode(&collision.y)
    );

    println!();
    let stage2_start = Instant::now();
    let hash = collider.hash();
    let mut aligner = Aligner::new(hash, &collision);
    println!(
        "Before: x_steps: {}, y_steps: {}",
        aligner.x_remaining, aligner.y_remaining
    );
    println!(
        "{}\t{}",
        hex::encode(&aligner.x.digest),
        hex::encode(&aligner.y.digest)
    );

    aligner.align(hash, &params);
    println!(
        "Equal: x_steps: {}, y_steps: {}",
        aligner.x_remaining, aligner.y_remaining
    );
    println!(
        "{}\t{}",
        hex::encode(&aligner.x.digest),
        hex::encode(&aligner.y.digest)
    );

    aligner.walk(hash, &params);
    println!(
        "Result: x_steps: {}, y_steps: {}",
        aligner.x_remaining, aligner.y_remaining
    );
    println!(
        "{}\t{}",
        hex::encode(&aligner.x.digest),
        hex::encode(&aligner.y.digest)
    );

    let stage2_secs = stage2_start.elapsed().as_secs_f64();
    let stage2_hashes = aligner.x.hash_count + aligner.y.hash_count;
    println!(
        "Stage 2 ended in {:.2} s ({:.0} hashes per second)",
        stage2_secs,
        stage2_hashes as f64 / stage2_secs.max(1e-9)
    );

    println!();
    let outcome = aligner.outcome(params.n);
    let total_hashes = stage_one.total_hashes + stage2_hashes;
    report::print_collision(
        &aligner.x,
        &aligner.y,
        outcome,
        total_hashes,
        start.elapsed().as_secs_f64(),
    );
    Ok(())
}
