use crate::areas::repository::Repository;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepoError;
use std::io::Write;

impl Repository {
    /// Print an object given its full or abbreviated id, or a revision naming a commit
    pub fn cat_file(&self, object_id: &str) -> anyhow::Result<()> {
        let object_id = self.find_object(object_id)?;
        let object = self.database().get(&object_id)?;

        match object {
            ObjectBox::Blob(blob) => {
                self.writer().write_all(blob.data())?;
            }
            object => {
                writeln!(self.writer(), "{}", object.display())?;
            }
        }

        Ok(())
    }

    fn find_object(&self, name: &str) -> anyhow::Result<ObjectId> {
        if Revision::looks_like_oid(name) {
            let mut candidates = self.database().find_objects_by_prefix(name)?;
            match candidates.len() {
                1 => return Ok(candidates.remove(0)),
                0 => {}
                _ => anyhow::bail!("short object id {name} is ambiguous"),
            }
        }

        match self.resolve(name) {
            Ok(oid) => Ok(oid),
            Err(RepoError::UnknownRef(_)) => anyhow::bail!("Not a valid object name {name}"),
            Err(error) => Err(error.into()),
        }
    }
}
