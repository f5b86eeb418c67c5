#![allow(non_snake_case)]

use std::{
    f64::consts::TAU,
    path::PathBuf,
};
use tracing::info;
use tracing_subscriber::{ fmt, prelude::*, EnvFilter };
use lindblad_kron::{
    Config,
    Liouvillian,
    LocalBackend,
};

const CAVITY_LEVELS: usize = 6;
const OMEGA_C: f64 = TAU * 5.0; // GHz
const OMEGA_Q: f64 = TAU * 5.1; // GHz
const G: f64 = TAU * 0.05; // GHz
const KAPPA: f64 = 1e-3; // 1/ns
const GAMMA: f64 = 5e-4; // 1/ns
const GAMMA_AUX: f64 = 2e-4; // 1/ns

fn init_logging() {
    let filter
        = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    // optional TOML config as the only argument
    let config: Config
        = match std::env::args().nth(1) {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
    let outdir = PathBuf::from("output");
    std::fs::create_dir_all(&outdir)?;

    let mut L = Liouvillian::new(config, LocalBackend::new())?;
    let cavity = L.create_subsystem(CAVITY_LEVELS)?;
    let qubit = L.create_qubit()?;
    // auxiliary three-level system decaying |2⟩ → |1⟩ → |0⟩
    let aux = L.create_basis_set(3)?;

    // H = ω_c a†a + ω_q σ†σ + g (a†σ + a σ†)
    L.add_term(OMEGA_C, &cavity.number())?;
    L.add_term(OMEGA_Q, &qubit.number())?;
    L.add_term2(G, &cavity.raise(), &qubit.lower())?;
    L.add_term2(G, &cavity.lower(), &qubit.raise())?;
    L.add_term2(0.1 * OMEGA_Q, &aux[1], &aux[1])?;
    L.add_term2(0.2 * OMEGA_Q, &aux[2], &aux[2])?;

    L.add_dissipator(KAPPA, &cavity.lower())?;
    L.add_dissipator(GAMMA, &qubit.lower())?;
    L.add_dissipator_basis(GAMMA_AUX, &aux[0], &aux[1])?;
    L.add_dissipator_basis(GAMMA_AUX, &aux[1], &aux[2])?;

    let total_levels = L.total_levels();
    let matrix = L.assemble()?;
    let (rows, cols) = matrix.shape();
    info!(total_levels, rows, cols, nnz = matrix.nnz(), "assembled Liouvillian");

    L.write_hamiltonian(outdir.join("jaynes_cummings_ham.txt"))?;
    L.write_hamiltonian_npy(outdir.join("jaynes_cummings_ham.npy"))?;

    println!("done");
    Ok(())
}
