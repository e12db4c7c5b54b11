//! 成分の入口・出口の取り扱い
//!
//! 入口点（このシャードの成分の種となる局面）はファイルから読み込んで
//! キー順の索引に保持する。出口点（非可逆手で成分を離れる局面）は
//! 発見ごとに出力ファイルへ追記し、シャード完了時に一時ファイルから
//! リネームで公開する。外部の読み手が途中状態を観測することはない。

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rfreecell_core::{EncodedKey, WhichMoves};

use crate::error::DbmError;
use crate::fingerprint::{parse_key, parse_moves, render_fingerprint, render_key, render_moves};

/// 入口点1つ
#[derive(Debug, Clone)]
pub struct EntryPoint {
    /// キューへ種を撒くときの探索深さ
    pub depth: u32,
    /// 入口ファイル内の行頭バイトオフセット（出口点との突き合わせ用）
    pub file_offset: u64,
    /// 初期配置からこの入口点までの手順列（出口点の手順の接頭辞になる）
    pub moves_prefix: Vec<u8>,
}

/// キー順の入口点索引
///
/// 同じキーの二重登録はプロトコル違反であり panic する。
pub struct EntryPointIndex {
    map: BTreeMap<EncodedKey, EntryPoint>,
}

impl EntryPointIndex {
    pub fn new() -> EntryPointIndex {
        EntryPointIndex { map: BTreeMap::new() }
    }

    pub fn insert(&mut self, key: EncodedKey, entry: EntryPoint) {
        let prev = self.map.insert(key, entry);
        assert!(prev.is_none(), "duplicate entry point {key:?}");
    }

    #[inline]
    pub fn lookup(&self, key: &EncodedKey) -> Option<&EntryPoint> {
        self.map.get(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for EntryPointIndex {
    fn default() -> EntryPointIndex {
        EntryPointIndex::new()
    }
}

/// 入口ファイルを読む。
///
/// 1行1件 `<base64キー> <深さ>`、任意の第3フィールドに
/// `<base64手順列>`。行頭のバイトオフセットを各件に残す。
pub fn read_entry_file(path: &Path) -> Result<Vec<(EncodedKey, EntryPoint)>, DbmError> {
    let file = File::open(path).map_err(|e| DbmError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut entries = Vec::new();
    let mut offset = 0u64;
    let mut line = String::new();
    for lineno in 1.. {
        line.clear();
        let n = reader.read_line(&mut line).map_err(|e| DbmError::io(path, e))?;
        if n == 0 {
            break;
        }
        let line_offset = offset;
        offset += n as u64;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let bad = |reason: &str| DbmError::EntryFile {
            path: path.into(),
            line: lineno,
            reason: reason.into(),
        };
        let key = fields
            .next()
            .and_then(parse_key)
            .ok_or_else(|| bad("malformed state key"))?;
        let depth = fields
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| bad("malformed depth"))?;
        let moves_prefix = match fields.next() {
            Some(s) => parse_moves(s).ok_or_else(|| bad("malformed move sequence"))?,
            None => Vec::new(),
        };
        if fields.next().is_some() {
            return Err(bad("trailing fields"));
        }
        entries.push((key, EntryPoint { depth, file_offset: line_offset, moves_prefix }));
    }
    Ok(entries)
}

/// 出口点ファイルの書き手
///
/// 追記は都度フラッシュし、`publish` で一時ファイルを最終名へ
/// アトミックにリネームする。
pub struct ExitPointWriter {
    tmp_path: PathBuf,
    final_path: PathBuf,
    file: BufWriter<File>,
    count: u64,
}

impl ExitPointWriter {
    pub fn create(final_path: &Path) -> Result<ExitPointWriter, DbmError> {
        let mut tmp_path = final_path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);
        let file = File::create(&tmp_path).map_err(|e| DbmError::io(&tmp_path, e))?;
        Ok(ExitPointWriter {
            tmp_path,
            final_path: final_path.into(),
            file: BufWriter::new(file),
            count: 0,
        })
    }

    /// 出口点1件を追記する
    pub fn append(
        &mut self,
        fingerprint: &WhichMoves,
        key: &EncodedKey,
        moves: &[u8],
    ) -> Result<(), DbmError> {
        writeln!(
            self.file,
            "{} {} {} {}",
            render_fingerprint(fingerprint),
            render_key(key),
            moves.len(),
            render_moves(moves),
        )
        .and_then(|()| self.file.flush())
        .map_err(|e| DbmError::io(&self.tmp_path, e))?;
        self.count += 1;
        Ok(())
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 一時ファイルを最終名へ公開する
    pub fn publish(mut self) -> Result<(), DbmError> {
        self.file.flush().map_err(|e| DbmError::io(&self.tmp_path, e))?;
        fs::rename(&self.tmp_path, &self.final_path)
            .map_err(|e| DbmError::io(&self.final_path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfreecell_core::ENCODED_LEN;

    fn key(n: u8) -> EncodedKey {
        EncodedKey::from_bytes(&[n; ENCODED_LEN]).unwrap()
    }

    #[test]
    fn test_read_entry_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.txt");
        let line1 = format!("{} 3\n", render_key(&key(1)));
        let line2 = format!("{} 4 {}\n", render_key(&key(2)), render_moves(&[0xF0, 0x12]));
        fs::write(&path, format!("{line1}{line2}")).unwrap();

        let entries = read_entry_file(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, key(1));
        assert_eq!(entries[0].1.depth, 3);
        assert_eq!(entries[0].1.file_offset, 0);
        assert!(entries[0].1.moves_prefix.is_empty());
        assert_eq!(entries[1].1.file_offset, line1.len() as u64);
        assert_eq!(entries[1].1.moves_prefix, vec![0xF0, 0x12]);
    }

    #[test]
    fn test_read_entry_file_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.txt");
        fs::write(&path, format!("{} 3\nnot-base64 7\n", render_key(&key(1)))).unwrap();

        match read_entry_file(&path) {
            Err(DbmError::EntryFile { path: reported, line, .. }) => {
                assert_eq!(reported, path);
                assert_eq!(line, 2);
            }
            other => panic!("expected EntryFile error, got {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "duplicate entry point")]
    fn test_duplicate_entry_point_panics() {
        let mut index = EntryPointIndex::new();
        let ep = EntryPoint { depth: 0, file_offset: 0, moves_prefix: Vec::new() };
        index.insert(key(1), ep.clone());
        index.insert(key(1), ep);
    }

    #[test]
    fn test_exit_writer_publishes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("exit_points.txt");
        let mut writer = ExitPointWriter::create(&final_path).unwrap();

        let mut fp = WhichMoves::zero();
        fp.bump(7);
        writer.append(&fp, &key(9), &[0xF3]).unwrap();
        assert_eq!(writer.count(), 1);

        // 公開前は最終名のファイルが存在しない
        assert!(!final_path.exists());
        writer.publish().unwrap();
        assert!(final_path.exists());

        let text = fs::read_to_string(&final_path).unwrap();
        let fields: Vec<&str> = text.trim().split(' ').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(crate::fingerprint::parse_fingerprint(fields[0]).unwrap(), fp);
        assert_eq!(parse_key(fields[1]), Some(key(9)));
        assert_eq!(fields[2], "1");
        assert_eq!(parse_moves(fields[3]), Some(vec![0xF3]));
    }
}
