pub mod propertymodel;
