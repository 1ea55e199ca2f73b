//! Two-level Bloch Hamiltonian of the Su-Schrieffer-Heeger (SSH) chain.
//!
//! In the basis of the two sublattice sites of a unit cell, the Hamiltonian at
//! crystal momentum `k` is
//! ```text
//! H(k) = [ Δ                  t + t' e^{ik} ]
//!        [ t + t' e^{-ik}     -Δ            ]
//! ```
//! which is Hermitian for all real `k` and real parameters.

use ndarray as nd;
use num_complex::Complex64 as C64;
use super::BlochBuild;

/// Initialization data for [`HBuilderSSH`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HSSHParams {
    /// Intracell hopping amplitude.
    pub t: f64,
    /// Intercell hopping amplitude.
    pub tp: f64,
    /// On-site energy imbalance between the two sublattices.
    pub delta: f64,
}

/// Builder for the SSH Bloch Hamiltonian.
#[derive(Clone, Debug, PartialEq)]
pub struct HBuilderSSH {
    params: HSSHParams,
}

impl HBuilderSSH {
    /// Create a new `HBuilderSSH`.
    pub fn new(params: HSSHParams) -> Self { Self { params } }

    /// Return a reference to the hopping and on-site parameters.
    pub fn params(&self) -> &HSSHParams { &self.params }

    /// Return the upper off-diagonal element `t + t' e^{ik}`.
    pub fn coupling(&self, k: f64) -> C64 {
        let HSSHParams { t, tp, .. } = self.params;
        t + tp * (C64::i() * k).exp()
    }

    /// Return the closed-form band energies `∓sqrt(Δ² + |t + t' e^{ik}|²)` in
    /// ascending order.
    pub fn energies(&self, k: f64) -> [f64; 2] {
        let e = (self.params.delta.powi(2) + self.coupling(k).norm_sqr()).sqrt();
        [-e, e]
    }
}

impl BlochBuild for HBuilderSSH {
    fn dim(&self) -> usize { 2 }

    fn build_at(&self, k: f64) -> nd::Array2<C64> {
        let delta = self.params.delta;
        let mut H: nd::Array2<C64> = nd::Array2::zeros((2, 2));
        H.diag_mut().assign(&nd::array![C64::from(delta), C64::from(-delta)]);
        H[[0, 1]] = self.coupling(k);
        H[[1, 0]] = H[[0, 1]].conj();
        H
    }
}
