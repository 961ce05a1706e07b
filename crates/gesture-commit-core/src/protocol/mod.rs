mod command;
mod decoder;
mod event;

pub use {
    command::{DetectorCommand, encode},
    decoder::decode,
    event::{AudioKind, DomainEvent, GestureKind},
};
