//! A small fully connected neural network engine for recognizing handwritten digits.
//!
//! Networks are built with a [LinearBuilder](network::LinearBuilder) or loaded from a pretrained
//! model document by the [ModelLoader](loader::ModelLoader), trained with the
//! [Trainer](trainer::Trainer) and queried through [classify](classify::classify).

pub mod a_funcs;
pub mod classify;
pub mod config;
pub mod initializer;
pub mod layers;
pub mod loader;
pub mod loss_funcs;
pub mod network;
pub mod optimizer;
pub mod policy;
pub mod serde;
pub mod storage;
pub mod trainer;
