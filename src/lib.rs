//! Generation of kernels that map basis function values and derivatives from the reference
//! cell of a finite element to the physical cell.
//!
//! The entry point is an [`ElementIr`](ir::ElementIr), a validated description of the dofs
//! of an element and the pullback each of them uses. From it,
//! [`transform_reference_basis_derivatives`](kernel::transform_reference_basis_derivatives)
//! builds a statement tree, which can be rendered to C/C++ source with
//! [`CRenderer`](render::CRenderer), embedded in a complete element with
//! [`ElementFactory`](factory::ElementFactory), or executed directly with the
//! [`interpret`] module.

pub mod ast;
pub mod combinations;
pub mod derivatives;
pub mod dofs;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod interpret;
pub mod io;
pub mod ir;
pub mod kernel;
pub mod mapping;
pub mod render;
pub mod settings;

pub use combinations::OdometerCombinations;
pub use settings::CodegenSettings;

pub extern crate nalgebra;
