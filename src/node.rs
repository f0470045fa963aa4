use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::classifier::invalid_data;

const LEAF: u16 = 0;
const CHILDREN: u16 = 1;

// Trees are grown to at most a few dozen levels; anything deeper is a corrupt artifact.
pub const MAX_SERIALIZED_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
	pub value: f64,
	pub column: usize,
}

impl Split {
	pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		if self.column > u16::MAX as usize {
			return Err(invalid_data(format!("split column {} does not fit the artifact format", self.column)));
		}

		writer.write_f64::<BigEndian>(self.value)?;
		writer.write_u16::<BigEndian>(self.column as u16)?;

		Ok(())
	}

	pub fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self> {
		let value = reader.read_f64::<BigEndian>()?;
		let column = reader.read_u16::<BigEndian>()? as usize;

		Ok(Self { value, column })
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	Leaf(f64),
	Children {
		left: Box<Node>,
		right: Box<Node>,
		split: Split,
	},
}

impl Node {
	pub fn predict(&self, x: &[f64]) -> f64 {
		match &self {
			Node::Leaf(value) => *value,
			Node::Children { left, right, split } => {
				if x[split.column] < split.value {
					left.predict(x)
				} else {
					right.predict(x)
				}
			},
		}
	}

	pub fn max_column(&self) -> Option<usize> {
		match &self {
			Node::Leaf(_) => None,
			Node::Children { left, right, split } => [left.max_column(), right.max_column(), Some(split.column)]
				.iter()
				.flatten()
				.copied()
				.max(),
		}
	}

	pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		match &self {
			Node::Leaf(value) => {
				writer.write_u16::<BigEndian>(LEAF)?;
				writer.write_f64::<BigEndian>(*value)?;
			},
			Node::Children { left, right, split } => {
				writer.write_u16::<BigEndian>(CHILDREN)?;
				split.serialize(writer)?;
				left.serialize(writer)?;
				right.serialize(writer)?;
			}
		}

		Ok(())
	}

	pub fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self> {
		Self::deserialize_at(reader, 0)
	}

	fn deserialize_at<R: Read>(reader: &mut R, depth: usize) -> std::io::Result<Self> {
		if depth > MAX_SERIALIZED_DEPTH {
			return Err(invalid_data(format!("tree deeper than {} levels", MAX_SERIALIZED_DEPTH)));
		}

		match reader.read_u16::<BigEndian>()? {
			LEAF => Ok(Node::Leaf(reader.read_f64::<BigEndian>()?)),
			CHILDREN => {
				let split = Split::deserialize(reader)?;
				let left = Box::new(Node::deserialize_at(reader, depth + 1)?);
				let right = Box::new(Node::deserialize_at(reader, depth + 1)?);

				Ok(Node::Children { split, left, right })
			},
			i => Err(invalid_data(format!("unknown node type {:?}", i))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn stump(column: usize, value: f64) -> Node {
		Node::Children {
			split: Split { column, value },
			left: Box::new(Node::Leaf(0.0)),
			right: Box::new(Node::Leaf(1.0)),
		}
	}

	#[test]
	fn predicts_by_threshold() {
		let node = stump(1, 0.5);

		assert_eq!(node.predict(&[9.0, 0.4]), 0.0);
		assert_eq!(node.predict(&[9.0, 0.5]), 1.0);
		assert_eq!(node.max_column(), Some(1));
		assert_eq!(Node::Leaf(1.0).max_column(), None);
	}

	#[test]
	fn serialization_preserves_tree() -> std::io::Result<()> {
		let node = Node::Children {
			split: Split { column: 0, value: -1.25 },
			left: Box::new(stump(3, 2.0)),
			right: Box::new(Node::Leaf(1.0)),
		};

		let mut bytes = Vec::new();
		node.serialize(&mut bytes)?;

		assert_eq!(Node::deserialize(&mut bytes.as_slice())?, node);
		Ok(())
	}

	#[test]
	fn rejects_unknown_node_type() {
		let bytes = [0u8, 7];
		let err = Node::deserialize(&mut &bytes[..]).unwrap_err();

		assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
	}

	#[test]
	fn rejects_truncated_tree() {
		let mut bytes = Vec::new();
		stump(0, 1.0).serialize(&mut bytes).unwrap();
		bytes.truncate(bytes.len() - 3);

		assert!(Node::deserialize(&mut bytes.as_slice()).is_err());
	}
}
