//! Network management: NAME field manipulation, address claiming, ISO
//! request answering and product information.
pub mod address_claiming;
pub mod iso_name;
pub mod iso_request;
pub mod product_information;
