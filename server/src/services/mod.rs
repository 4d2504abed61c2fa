pub mod boundary_loader;
