use super::node::FileKind;

/// Badge and theme color for a changed file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration {
    pub badge: char,
    pub color_key: &'static str,
}

impl FileKind {
    pub fn decoration(self) -> Decoration {
        match self {
            FileKind::Added => Decoration {
                badge: 'A',
                color_key: "gitDecoration.addedResourceForeground",
            },
            FileKind::Modified => Decoration {
                badge: 'M',
                color_key: "gitDecoration.modifiedResourceForeground",
            },
            FileKind::Deleted => Decoration {
                badge: 'D',
                color_key: "gitDecoration.deletedResourceForeground",
            },
            FileKind::Renamed => Decoration {
                badge: 'R',
                color_key: "gitDecoration.renamedResourceForeground",
            },
            FileKind::Untracked => Decoration {
                badge: 'U',
                color_key: "gitDecoration.untrackedResourceForeground",
            },
        }
    }
}
