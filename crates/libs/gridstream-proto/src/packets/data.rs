//! Data packets, carried in frame type [`DATA_FRAME_TYPE`].

use std::sync::Arc;

use super::catalog;
use crate::field::Field;
use crate::packet::{PacketFamily, PacketKind};

pub const DATA_FRAME_TYPE: u8 = 0xD5;

pub(super) fn root_kind(base: &Arc<PacketKind>) -> Arc<PacketKind> {
    PacketKind::builder("DataPacket")
        .extends(base)
        .frame_type(DATA_FRAME_TYPE)
        .field(Field::bytes("destination", 1, 4))
        .field(Field::bytes("source", 5, 4))
        .build()
        .expect("data packet kind is well-formed")
}

pub fn root() -> &'static Arc<PacketKind> {
    &catalog().data_root
}

pub fn family() -> &'static Arc<PacketFamily> {
    &catalog().data
}
