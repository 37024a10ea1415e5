use bytes::Bytes;

use crate::error::AssetError;

/// Length prefix size (big-endian u32)
const PREFIX_LEN: usize = 4;

/// Walk `[len: u32 BE][len bytes]` records to the end of the buffer
pub(super) fn parse(data: &Bytes) -> Result<Vec<Bytes>, AssetError> {
    let mut records = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let available = data.len() - offset;
        if available < PREFIX_LEN {
            return Err(AssetError::Truncated {
                offset,
                declared: PREFIX_LEN,
                available,
            });
        }

        let mut prefix = [0u8; PREFIX_LEN];
        prefix.copy_from_slice(&data[offset..offset + PREFIX_LEN]);
        let declared = u32::from_be_bytes(prefix) as usize;

        let body_start = offset + PREFIX_LEN;
        let available = data.len() - body_start;
        if declared > available {
            return Err(AssetError::Truncated {
                offset,
                declared,
                available,
            });
        }

        records.push(data.slice(body_start..body_start + declared));
        offset = body_start + declared;
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records() {
        let data = Bytes::from_static(&[0, 0, 0, 2, 0xaa, 0xbb, 0, 0, 0, 0, 0, 0, 0, 1, 0xcc]);
        let records = parse(&data).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(&records[0][..], &[0xaa, 0xbb]);
        assert!(records[1].is_empty());
        assert_eq!(&records[2][..], &[0xcc]);
    }

    #[test]
    fn test_final_prefix_overruns() {
        let data = Bytes::from_static(&[0, 0, 0, 1, 0xaa, 0, 0, 0, 9, 1, 2, 3]);
        match parse(&data) {
            Err(AssetError::Truncated {
                offset,
                declared,
                available,
            }) => {
                assert_eq!(offset, 5);
                assert_eq!(declared, 9);
                assert_eq!(available, 3);
            }
            other => panic!("expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_prefix() {
        let data = Bytes::from_static(&[0, 0, 0, 1, 0xaa, 0, 0]);
        assert!(matches!(
            parse(&data),
            Err(AssetError::Truncated { offset: 5, declared: 4, available: 2 })
        ));
    }
}
