
mod property_shape;
