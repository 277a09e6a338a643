pub mod bill_mapper;

pub use bill_mapper::BillMapper;
