//! Packet catalog shipped with the codec.
//!
//! Every kind descends from [`base`], which declares the `packet_type`
//! discriminant byte. The catalog is built once, on first use, in a fixed
//! order; extension code builds its own kinds and families on top of it.

pub mod data;
pub mod routing;

use std::sync::{Arc, OnceLock};

use crate::field::Field;
use crate::packet::{PacketFamily, PacketKind};

struct Catalog {
    base: Arc<PacketKind>,
    generic: Arc<PacketFamily>,
    routing_root: Arc<PacketKind>,
    arp: Arc<PacketKind>,
    routing: Arc<PacketFamily>,
    data_root: Arc<PacketKind>,
    data: Arc<PacketFamily>,
}

fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let base = PacketKind::builder("Packet")
            .field(Field::byte("packet_type", 0))
            .build()
            .expect("base packet kind is well-formed");
        let routing_root = routing::root_kind(&base);
        let arp = routing::arp_kind(&routing_root);
        let data_root = data::root_kind(&base);

        let generic = PacketFamily::new(Arc::clone(&base))
            .with(Arc::clone(&arp))
            .expect("generic family registrations are unique");
        let routing = PacketFamily::new(Arc::clone(&routing_root))
            .with(Arc::clone(&arp))
            .expect("routing family registrations are unique");
        let data = PacketFamily::new(Arc::clone(&data_root));

        Catalog {
            base,
            generic: Arc::new(generic),
            routing_root,
            arp,
            routing: Arc::new(routing),
            data_root,
            data: Arc::new(data),
        }
    })
}

/// Root of every packet kind: `packet_type` at offset 0.
pub fn base() -> &'static Arc<PacketKind> {
    &catalog().base
}

/// Family used when nothing narrower is known: rooted at [`base`], with every
/// catalog subtype registered.
pub fn generic() -> &'static Arc<PacketFamily> {
    &catalog().generic
}
