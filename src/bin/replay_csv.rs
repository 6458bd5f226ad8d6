use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};

use portero::config::PorteroConfig;
use portero::pipeline::ControlLoop;
use portero::replay::load_prob_trace;

struct ReplayOptions {
    alpha: Option<f32>,
    umbral: Option<u32>,
}

fn parse_args() -> Result<(PathBuf, ReplayOptions)> {
    let mut alpha = None;
    let mut umbral = None;
    let mut csv_path: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--alpha" => {
                let value = args.next().ok_or_else(|| anyhow!("--alpha requiere un valor"))?;
                alpha = Some(value.parse()?);
            }
            "--umbral" => {
                let value = args.next().ok_or_else(|| anyhow!("--umbral requiere un valor"))?;
                umbral = Some(value.parse()?);
            }
            _ => {
                if csv_path.is_some() {
                    bail!("Uso: replay_csv [--alpha X] [--umbral N] <traza.csv>");
                }
                csv_path = Some(PathBuf::from(arg));
            }
        }
    }

    let csv_path = csv_path.ok_or_else(|| anyhow!("Debes especificar una traza CSV"))?;
    Ok((csv_path, ReplayOptions { alpha, umbral }))
}

/// Reproduce una traza de probabilidades grabada a través del camino real de
/// suavizado + debounce, con un actuador en seco que solo imprime los
/// comandos. Útil para ajustar alpha y umbral sin hardware.
fn main() -> Result<()> {
    env_logger::init();

    let (csv_path, opts) = parse_args()?;
    println!("🎞️  Reproduciendo traza desde {:?}", csv_path);

    let mut config = PorteroConfig::default();
    if let Some(alpha) = opts.alpha {
        config.alpha = alpha;
    }
    if let Some(umbral) = opts.umbral {
        config.umbral_confirmacion = umbral;
    }
    config.validate()?;

    let trace = load_prob_trace(&csv_path)?;
    println!(
        "ℹ️  {} frames, alpha={}, umbral={}\n",
        trace.len(),
        config.alpha,
        config.umbral_confirmacion
    );

    let mut lazo = ControlLoop::new(&config);
    let mut comandos = 0usize;

    for (frame_idx, probs) in trace.iter().enumerate() {
        let decision = lazo.evaluate(probs);
        if let Some(target) = decision.target {
            comandos += 1;
            println!(
                "frame {:>5}: {} → moveTo({:.0}°) [{:?}]",
                frame_idx,
                decision.summary,
                lazo.angle_for(target),
                target
            );
            // En seco siempre "responde bien"
            lazo.confirm(target);
        }
    }

    println!(
        "\n🏁 {} comandos emitidos, posición final {:?}",
        comandos,
        lazo.position()
    );
    Ok(())
}
