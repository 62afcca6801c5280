//! # bermudan-processes
//!
//! The Gaussian factor processes underneath the short-rate models.
//!
//! Every model in the workspace writes its short rate as a deterministic
//! shift applied to zero-mean Ornstein–Uhlenbeck factors. This crate holds
//! those factors: their drift and diffusion (the PDE coefficients) and their
//! exact one-step conditional moments (the lattice transition step).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod g2_process;
pub mod ornstein_uhlenbeck_process;
pub mod stochastic_process;

pub use g2_process::G2Process;
pub use ornstein_uhlenbeck_process::OrnsteinUhlenbeckProcess;
pub use stochastic_process::StochasticProcess1D;
