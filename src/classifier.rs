use std::io::{Read, Write};

pub trait Classifier: Sized {
	fn predict(&self, x: &[f64]) -> f64;

	/// Number of input features the classifier reads, i.e. the highest column it splits on plus one.
	fn features_used(&self) -> usize;

	fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;
	fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self>;
}

pub fn invalid_data(message: impl Into<String>) -> std::io::Error {
	std::io::Error::new(std::io::ErrorKind::InvalidData, message.into())
}
