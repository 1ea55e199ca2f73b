//! Band structures of Bloch Hamiltonians swept over a momentum grid.
//!
//! Each momentum sample is diagonalized independently with
//! [`decompose`][crate::spectral::decompose]; row `j` of every output array
//! belongs to the `j`-th momentum sample, and bands within a row are in
//! ascending order of energy. No attempt is made to keep eigenvector phases
//! continuous between neighboring samples.

use std::{ f64::consts::TAU, fs::File, path::Path };
use log::{ debug, trace, warn };
use ndarray as nd;
use ndarray_npy::NpzWriter;
use num_complex::Complex64 as C64;
use rayon::prelude::*;
use crate::{
    chop::{ Chop, ChopMut },
    error::{ OutputError, SpectralError, SpectralResult },
    spectral::{ EigenResult, decompose },
};

pub mod ssh;
pub use ssh::{ HBuilderSSH, HSSHParams };

/// Basic requirements for a momentum-space Hamiltonian builder.
pub trait BlochBuild {
    /// Number of bands, i.e. the size of every matrix returned by
    /// [`Self::build_at`].
    fn dim(&self) -> usize;

    /// Build the Bloch Hamiltonian at crystal momentum `k`.
    fn build_at(&self, k: f64) -> nd::Array2<C64>;
}

/// Generate `nk` evenly spaced momenta covering the closed interval
/// `[0, 2π]`.
///
/// Both endpoints are included, so the last sample repeats the physics of the
/// first.
pub fn k_grid(nk: usize) -> nd::Array1<f64> {
    nd::Array1::linspace(0.0, TAU, nk)
}

/// Energies and eigenstates of a Bloch Hamiltonian over a momentum grid.
///
/// For `K` momenta and `N` bands:
/// - `k` has shape `[K]`
/// - `evals` has shape `[K, N]`, ascending along the second axis
/// - `evecs` has shape `[K, N, N]`, where `evecs[[j, .., b]]` is the
///   eigenvector belonging to `evals[[j, b]]`
#[derive(Clone, Debug, PartialEq)]
pub struct BandStructure {
    k: nd::Array1<f64>,
    evals: nd::Array2<f64>,
    evecs: nd::Array3<C64>,
}

impl BandStructure {
    /// Return the number of momentum samples.
    pub fn num_k(&self) -> usize { self.k.len() }

    /// Return the number of bands.
    pub fn num_bands(&self) -> usize { self.evals.ncols() }

    /// Return the momentum grid.
    pub fn k(&self) -> &nd::Array1<f64> { &self.k }

    /// Return the band energies.
    pub fn evals(&self) -> &nd::Array2<f64> { &self.evals }

    /// Return the eigenstates.
    pub fn evecs(&self) -> &nd::Array3<C64> { &self.evecs }

    /// Return the energies of the `b`-th band over all momenta.
    ///
    /// *Panics* if `b` is out of bounds.
    pub fn band(&self, b: usize) -> nd::ArrayView1<'_, f64> {
        self.evals.column(b)
    }

    /// Find the smallest separation between bands `b` and `b + 1` over all
    /// momenta, returning the index of the momentum sample where it occurs
    /// along with its value.
    ///
    /// Returns `None` if there are no momenta or `b + 1` is not a band.
    pub fn gap(&self, b: usize) -> Option<(usize, f64)> {
        if b + 1 >= self.num_bands() { return None; }
        self.evals.outer_iter()
            .map(|e| e[b + 1] - e[b])
            .enumerate()
            .min_by(|(_, g1), (_, g2)| g1.total_cmp(g2))
    }

    /// Unpack into `(k, evals, evecs)`.
    pub fn into_arrays(self)
        -> (nd::Array1<f64>, nd::Array2<f64>, nd::Array3<C64>)
    {
        (self.k, self.evals, self.evecs)
    }

    /// Write `k`, `evals`, and `evecs` to a single `.npz` archive.
    pub fn save_npz<P>(&self, path: P) -> Result<(), OutputError>
    where P: AsRef<Path>
    {
        let mut npz = NpzWriter::new(File::create(path)?);
        npz.add_array("k", &self.k)?;
        npz.add_array("evals", &self.evals)?;
        npz.add_array("evecs", &self.evecs)?;
        npz.finish()?;
        Ok(())
    }
}

/// Chops band energies and eigenstates; the momentum grid is left alone.
impl Chop for BandStructure {
    fn chop(mut self, tol: f64) -> Self {
        self.evals.chop_mut(tol);
        self.evecs.chop_mut(tol);
        self
    }
}

// diagonalize at a single momentum, requiring real energies
fn diagonalize_at<H>(h: &H, k: f64)
    -> SpectralResult<(nd::Array1<f64>, nd::Array2<C64>)>
where H: BlochBuild + ?Sized
{
    let n = h.dim();
    let H = h.build_at(k);
    let (rows, cols) = H.dim();
    if rows == cols && rows != n {
        return Err(SpectralError::DimMismatch { expected: n, got: rows });
    }
    match decompose(&H)? {
        EigenResult::Hermitian { values, vectors } => Ok((values, vectors)),
        EigenResult::General { .. } => Err(SpectralError::NotHermitian { n }),
    }
}

fn assemble<I>(k: &nd::Array1<f64>, n: usize, results: I)
    -> SpectralResult<BandStructure>
where I: IntoIterator<Item = SpectralResult<(nd::Array1<f64>, nd::Array2<C64>)>>
{
    let nk = k.len();
    let mut evals: nd::Array2<f64> = nd::Array2::zeros((nk, n));
    let mut evecs: nd::Array3<C64> = nd::Array3::zeros((nk, n, n));
    let iter
        = results.into_iter()
        .zip(k)
        .zip(evals.outer_iter_mut().zip(evecs.outer_iter_mut()))
        .enumerate();
    for (j, ((res, &kj), (ej, vj))) in iter {
        let (E, V) = res.map_err(|err| {
            warn!("band sweep aborted at k[{}] = {}: {}", j, kj, err);
            err
        })?;
        trace!("k[{}] = {}: {}", j, kj, E);
        E.move_into(ej);
        V.move_into(vj);
    }
    Ok(BandStructure { k: k.clone(), evals, evecs })
}

/// Diagonalize `h` at every momentum in `k`, one after another.
///
/// Stops at the first momentum where diagonalization fails and returns that
/// error; no partial band structure is produced.
pub fn sweep_with<H>(h: &H, k: &nd::Array1<f64>)
    -> SpectralResult<BandStructure>
where H: BlochBuild + ?Sized
{
    let n = h.dim();
    let bands = assemble(k, n, k.iter().map(|&kj| diagonalize_at(h, kj)))?;
    debug!("swept {} momenta over {} bands", k.len(), n);
    Ok(bands)
}

/// Like [`sweep_with`], but diagonalizes all momenta in parallel.
///
/// If more than one momentum fails, the error from the one with the lowest
/// index is returned.
pub fn sweep_par_with<H>(h: &H, k: &nd::Array1<f64>)
    -> SpectralResult<BandStructure>
where H: BlochBuild + Sync + ?Sized
{
    let n = h.dim();
    let results: Vec<SpectralResult<(nd::Array1<f64>, nd::Array2<C64>)>>
        = (0..k.len()).into_par_iter()
        .map(|j| diagonalize_at(h, k[j]))
        .collect();
    let bands = assemble(k, n, results)?;
    debug!("swept {} momenta over {} bands (parallel)", k.len(), n);
    Ok(bands)
}

/// Compute the band structure of the two-level SSH Bloch Hamiltonian with
/// intracell hopping `t`, intercell hopping `tp`, and on-site imbalance
/// `delta` over `nk` momenta from [`k_grid`].
pub fn sweep(t: f64, tp: f64, delta: f64, nk: usize)
    -> SpectralResult<BandStructure>
{
    let h = HBuilderSSH::new(HSSHParams { t, tp, delta });
    sweep_with(&h, &k_grid(nk))
}
