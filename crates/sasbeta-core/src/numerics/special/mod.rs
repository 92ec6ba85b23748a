pub mod bessel;
pub mod gamma;
pub mod kernels;
pub mod quadrature;

pub use bessel::bessel_j1;
pub use gamma::ln_gamma;
pub use kernels::{
    bessel_2j1x_x, sas_2j1x_x, sas_3j1x_x, sas_sinx_x, sinc, spherical_3j1x_x,
    SPHERICAL_KERNEL_SERIES_CUTOFF,
};
pub use quadrature::{GaussLegendreRule, gauss_legendre};
