//! Program kinds and frame/context bookkeeping.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_util.c
//!
//! Translated sequences are searched in six reading frames. A query context
//! packs (query index, strand, frame) into one integer so that per-context
//! statistics can be stored in flat arrays.

/// Number of reading frames for a translated nucleotide sequence.
pub const NUM_FRAMES: usize = 6;

/// Number of strands for a nucleotide sequence.
pub const NUM_STRANDS: usize = 2;

/// Nucleotides per codon.
pub const CODON_LENGTH: i32 = 3;

/// BLAST program flavours that matter for linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlastProgram {
    /// Nucleotide query, nucleotide subject.
    Blastn,
    /// Protein query, protein subject.
    Blastp,
    /// Translated nucleotide query, protein subject.
    Blastx,
    /// Protein query, translated nucleotide subject.
    Tblastn,
    /// Translated nucleotide query, translated nucleotide subject.
    Tblastx,
}

impl BlastProgram {
    /// True when query contexts encode translated reading frames.
    pub fn is_translated_query(self) -> bool {
        matches!(self, BlastProgram::Blastx | BlastProgram::Tblastx)
    }

    /// True when the subject is translated, so subject lengths are in
    /// nucleotides but alignment coordinates are in residues.
    pub fn subject_is_translated(self) -> bool {
        matches!(self, BlastProgram::Tblastn | BlastProgram::Tblastx)
    }

    /// True when the query is a nucleotide sequence searched on both strands.
    pub fn query_is_nucleotide(self) -> bool {
        matches!(
            self,
            BlastProgram::Blastn | BlastProgram::Blastx | BlastProgram::Tblastx
        )
    }

    /// Contexts per query: 6 frames, 2 strands, or 1.
    pub fn contexts_per_query(self) -> usize {
        if self.is_translated_query() {
            NUM_FRAMES
        } else if self == BlastProgram::Blastn {
            NUM_STRANDS
        } else {
            1
        }
    }

    /// Divisor that folds a context number down to its query strand.
    ///
    /// Translated queries have three frames per strand.
    pub fn strand_factor(self) -> usize {
        if self.is_translated_query() {
            3
        } else {
            1
        }
    }
}

/// Convert a frame number to a context offset within its query.
///
/// Translated frames 1,2,3 map to 0,1,2 and -1,-2,-3 map to 3,4,5.
/// Nucleotide strands 1 and -1 map to 0 and 1. Frame 0 (protein) maps to 0.
pub fn frame_to_context(frame: i16, program: BlastProgram) -> usize {
    if program.is_translated_query() {
        if frame > 0 {
            (frame - 1) as usize
        } else if frame < 0 {
            (2 - frame) as usize
        } else {
            0
        }
    } else if program.query_is_nucleotide() && frame < 0 {
        1
    } else {
        0
    }
}

/// Inverse of [`frame_to_context`] for the query frame of a context.
pub fn context_to_frame(context: usize, program: BlastProgram) -> i16 {
    match program {
        BlastProgram::Blastn => {
            if context % NUM_STRANDS == 0 {
                1
            } else {
                -1
            }
        }
        BlastProgram::Blastx | BlastProgram::Tblastx => {
            let within = (context % NUM_FRAMES) as i16;
            if within < 3 {
                within + 1
            } else {
                2 - within
            }
        }
        BlastProgram::Blastp | BlastProgram::Tblastn => 0,
    }
}

/// Query ordinal that owns a context.
pub fn query_index_from_context(context: usize, program: BlastProgram) -> usize {
    context / program.contexts_per_query()
}
